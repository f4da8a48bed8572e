//! The preserved-original provider: entries derived from the comments the
//! target tree already carries.

use crate::diff::extract_type;
use crate::keys::MemberIndex;
use crate::model::{DocEntry, DocTree};
use crate::qualify::{sanitize, Qualifier};
use crate::source::{Javadoc, SourceUnit, TypeDecl};

/// Documentation already present on `ty`.
///
/// Without a tag, every comment is read as a regular entry. With a tag, each
/// comment's whole body becomes the single content of that tag and its block
/// tags are dropped, so new content can sit next to the old text.
pub fn original_tree(
    qualifier: &Qualifier<'_>,
    unit: &SourceUnit,
    ty: &TypeDecl,
    tag: Option<&str>,
    escape: bool,
) -> Option<DocTree> {
    match tag {
        Some(tag) => wrapped_tree(ty, tag, escape),
        None => extract_type(qualifier, unit, ty, escape),
    }
}

fn wrap(doc: Option<&Javadoc>, tag: &str, escape: bool) -> Option<DocEntry> {
    let body = doc?.body();
    if body.trim().is_empty() {
        return None;
    }
    let body = if escape { sanitize(&body) } else { body };
    let mut entry = DocEntry::default();
    entry.tags.insert(tag.to_string(), vec![body]);
    Some(entry)
}

fn wrapped_tree(ty: &TypeDecl, tag: &str, escape: bool) -> Option<DocTree> {
    let index = MemberIndex::new(ty);
    DocTree {
        clazz: wrap(ty.javadoc.as_ref(), tag, escape),
        methods: index
            .methods
            .iter()
            .filter_map(|(key, m)| wrap(m.javadoc.as_ref(), tag, escape).map(|e| (key.clone(), e)))
            .collect(),
        fields: index
            .fields
            .iter()
            .filter_map(|(key, f)| wrap(f.javadoc.as_ref(), tag, escape).map(|e| (key.clone(), e)))
            .collect(),
        inner_types: index
            .nested
            .iter()
            .filter_map(|(key, nested)| wrapped_tree(nested, tag, escape).map(|t| (key.clone(), t)))
            .collect(),
    }
    .pruned()
}
