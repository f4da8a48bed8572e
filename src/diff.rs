//! Diff engine: align a clean and a modified declaration tree by identity key
//! and keep only the documentation that changed.
//!
//! Alignment is strict: every method, field and named nested type must exist
//! on both sides. Entries are compared after reference canonicalization, so
//! `{@link Foo}` and `{@link com.example.Foo}` count as the same text.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DocPatchError, MemberKind, Result, Side};
use crate::keys::MemberIndex;
use crate::model::{DocEntry, DocTree};
use crate::qualify::{sanitize, DocContext, Qualifier};
use crate::source::{Javadoc, SourceUnit, TypeDecl};

const PARAM_TAG: &str = "param";

/// A type declaration together with its unit and simple-name path.
#[derive(Debug, Clone)]
struct Node<'a> {
    unit: &'a SourceUnit,
    ty: &'a TypeDecl,
    path: Vec<&'a str>,
}

impl<'a> Node<'a> {
    fn root(unit: &'a SourceUnit, ty: &'a TypeDecl) -> Self {
        Node {
            unit,
            ty,
            path: vec![ty.name.as_str()],
        }
    }

    fn child(&self, ty: &'a TypeDecl) -> Self {
        let mut path = self.path.clone();
        path.push(ty.name.as_str());
        Node {
            unit: self.unit,
            ty,
            path,
        }
    }

    fn ctx(&self) -> DocContext<'a> {
        DocContext::new(self.unit, self.ty)
    }

    fn qualified_name(&self) -> String {
        self.unit.qualified_name(&self.path)
    }

    fn parameter_names(&self) -> Vec<String> {
        self.ty.parameter_names().unwrap_or_default()
    }
}

/// Read a comment into an entry: body and tags reference-canonicalized,
/// parameter tokens reattached, no parameter realignment.
pub fn read_entry(
    qualifier: &Qualifier<'_>,
    ctx: &DocContext<'_>,
    doc: &Javadoc,
    escape: bool,
) -> DocEntry {
    let text = |raw: &str| {
        if escape {
            sanitize(raw)
        } else {
            raw.to_string()
        }
    };

    let mut entry = DocEntry::with_body(qualifier.expand(ctx, &text(&doc.body()), None));
    for tag in &doc.tags {
        let content = tag.content_with_param(&text(&tag.content));
        entry
            .tags
            .entry(tag.name.clone())
            .or_default()
            .push(qualifier.process_tag(&tag.name, ctx, &content, None));
    }
    entry
}

/// Remove everything `clean` already says: an equal body, and tag contents
/// matched one-for-one.
fn subtract(mut entry: DocEntry, clean: &DocEntry) -> DocEntry {
    if entry.body == clean.body {
        entry.body = None;
    }
    for (name, clean_values) in &clean.tags {
        if let Some(values) = entry.tags.get_mut(name) {
            for value in clean_values {
                if let Some(pos) = values.iter().position(|v| v == value) {
                    values.remove(pos);
                }
            }
        }
    }
    entry.tags.retain(|_, values| !values.is_empty());
    entry
}

/// Split `"name rest of text"` into its leading token and the rest.
fn split_param(content: &str) -> (&str, &str) {
    let content = content.trim();
    content
        .split_once(char::is_whitespace)
        .unwrap_or((content, ""))
}

/// Move `@param` contents matching `names` into a positional array.
/// `None` when there is nothing to align.
fn take_param_docs(tags: &mut BTreeMap<String, Vec<String>>, names: &[String]) -> Option<Vec<String>> {
    if names.is_empty() {
        return None;
    }
    let remaining = tags.get_mut(PARAM_TAG)?;
    let docs = names
        .iter()
        .map(|name| {
            match remaining
                .iter()
                .position(|content| split_param(content).0 == name)
            {
                Some(pos) => {
                    let content = remaining.remove(pos);
                    split_param(&content)
                        .1
                        .lines()
                        .map(str::trim)
                        .collect::<Vec<_>>()
                        .join(" ")
                        .trim()
                        .to_string()
                }
                None => String::new(),
            }
        })
        .collect();
    if remaining.is_empty() {
        tags.remove(PARAM_TAG);
    }
    Some(docs)
}

fn realign(entry: &mut DocEntry, parameters: &[String], type_parameters: &[String]) {
    if let Some(docs) = take_param_docs(&mut entry.tags, parameters) {
        entry.parameters = Some(docs);
    }
    let type_names: Vec<String> = type_parameters.iter().map(|t| format!("<{}>", t)).collect();
    if let Some(docs) = take_param_docs(&mut entry.tags, &type_names) {
        entry.type_parameters = Some(docs);
    }
}

fn describe(
    qualifier: &Qualifier<'_>,
    ctx: &DocContext<'_>,
    doc: &Javadoc,
    clean: Option<&DocEntry>,
    parameters: &[String],
    type_parameters: &[String],
    escape: bool,
) -> Option<DocEntry> {
    let mut entry = read_entry(qualifier, ctx, doc, escape);
    if let Some(clean) = clean {
        entry = subtract(entry, clean);
    }
    realign(&mut entry, parameters, type_parameters);
    entry.pruned()
}

/// Pair up the keys of both sides, failing on the first one-sided key.
fn aligned<'k, T: Copy>(
    kind: MemberKind,
    clean: &'k BTreeMap<String, T>,
    modified: &'k BTreeMap<String, T>,
    clean_name: &str,
    modified_name: &str,
) -> Result<Vec<(&'k str, T, T)>> {
    let keys: BTreeSet<&String> = clean.keys().chain(modified.keys()).collect();
    keys.into_iter()
        .map(|key| match (clean.get(key), modified.get(key)) {
            (Some(c), Some(m)) => Ok((key.as_str(), *c, *m)),
            (c, _) => Err(DocPatchError::AlignmentMismatch {
                kind,
                key: key.clone(),
                missing: if c.is_none() { Side::Clean } else { Side::Modified },
                clean_type: clean_name.to_string(),
                modified_type: modified_name.to_string(),
            }),
        })
        .collect()
}

/// Diffs clean/modified pairs. Each side resolves references against its
/// own universe.
pub struct Differ<'a> {
    clean: &'a Qualifier<'a>,
    modified: &'a Qualifier<'a>,
}

impl<'a> Differ<'a> {
    pub fn new(clean: &'a Qualifier<'a>, modified: &'a Qualifier<'a>) -> Self {
        Differ { clean, modified }
    }

    /// Diff two versions of one compilation unit. `None` when the
    /// documentation is identical everywhere.
    pub fn diff_units(
        &self,
        unit_name: &str,
        clean: &SourceUnit,
        modified: &SourceUnit,
    ) -> Result<Option<DocTree>> {
        let clean_ty = clean.single_type(unit_name)?;
        let modified_ty = modified.single_type(unit_name)?;
        self.diff_types(clean, clean_ty, modified, modified_ty)
    }

    pub fn diff_types(
        &self,
        clean_unit: &SourceUnit,
        clean: &TypeDecl,
        modified_unit: &SourceUnit,
        modified: &TypeDecl,
    ) -> Result<Option<DocTree>> {
        self.diff_nodes(&Node::root(clean_unit, clean), &Node::root(modified_unit, modified))
    }

    fn diff_nodes(&self, clean: &Node<'_>, modified: &Node<'_>) -> Result<Option<DocTree>> {
        let clean_name = clean.qualified_name();
        let modified_name = modified.qualified_name();
        let clean_index = MemberIndex::strict(clean.ty, &clean_name)?;
        let modified_index = MemberIndex::strict(modified.ty, &modified_name)?;

        let mut tree = DocTree {
            clazz: self.diff_doc(
                clean,
                clean.ty.javadoc.as_ref(),
                modified,
                modified.ty.javadoc.as_ref(),
                &modified.parameter_names(),
                &modified.ty.type_parameters,
            ),
            ..Default::default()
        };

        for (key, c, m) in aligned(
            MemberKind::Method,
            &clean_index.methods,
            &modified_index.methods,
            &clean_name,
            &modified_name,
        )? {
            let entry = self.diff_doc(
                clean,
                c.javadoc.as_ref(),
                modified,
                m.javadoc.as_ref(),
                &m.parameter_names(),
                &m.type_parameters,
            );
            if let Some(entry) = entry {
                tree.methods.insert(key.to_string(), entry);
            }
        }

        for (key, c, m) in aligned(
            MemberKind::Field,
            &clean_index.fields,
            &modified_index.fields,
            &clean_name,
            &modified_name,
        )? {
            let entry = self.diff_doc(clean, c.javadoc.as_ref(), modified, m.javadoc.as_ref(), &[], &[]);
            if let Some(entry) = entry {
                tree.fields.insert(key.to_string(), entry);
            }
        }

        for (key, c, m) in aligned(
            MemberKind::NestedType,
            &clean_index.nested,
            &modified_index.nested,
            &clean_name,
            &modified_name,
        )? {
            if let Some(inner) = self.diff_nodes(&clean.child(c), &modified.child(m))? {
                tree.inner_types.insert(key.to_string(), inner);
            }
        }

        Ok(tree.pruned())
    }

    fn diff_doc(
        &self,
        clean: &Node<'_>,
        clean_doc: Option<&Javadoc>,
        modified: &Node<'_>,
        modified_doc: Option<&Javadoc>,
        parameters: &[String],
        type_parameters: &[String],
    ) -> Option<DocEntry> {
        let modified_doc = modified_doc?;
        let clean_entry = clean_doc.map(|doc| read_entry(self.clean, &clean.ctx(), doc, false));
        describe(
            self.modified,
            &modified.ctx(),
            modified_doc,
            clean_entry.as_ref(),
            parameters,
            type_parameters,
            false,
        )
    }
}

/// Document a single tree with no clean counterpart: every comment becomes
/// an entry. Duplicate keys are tolerated; the last declaration wins.
pub fn extract_type(
    qualifier: &Qualifier<'_>,
    unit: &SourceUnit,
    ty: &TypeDecl,
    escape: bool,
) -> Option<DocTree> {
    extract_node(qualifier, &Node::root(unit, ty), escape)
}

fn extract_node(qualifier: &Qualifier<'_>, node: &Node<'_>, escape: bool) -> Option<DocTree> {
    let ctx = node.ctx();
    let index = MemberIndex::new(node.ty);
    let entry = |doc: Option<&Javadoc>, parameters: &[String], type_parameters: &[String]| {
        doc.and_then(|doc| describe(qualifier, &ctx, doc, None, parameters, type_parameters, escape))
    };

    DocTree {
        clazz: entry(
            node.ty.javadoc.as_ref(),
            &node.parameter_names(),
            &node.ty.type_parameters,
        ),
        methods: index
            .methods
            .iter()
            .filter_map(|(key, m)| {
                entry(m.javadoc.as_ref(), &m.parameter_names(), &m.type_parameters)
                    .map(|e| (key.clone(), e))
            })
            .collect(),
        fields: index
            .fields
            .iter()
            .filter_map(|(key, f)| entry(f.javadoc.as_ref(), &[], &[]).map(|e| (key.clone(), e)))
            .collect(),
        inner_types: index
            .nested
            .iter()
            .filter_map(|(key, nested)| {
                extract_node(qualifier, &node.child(nested), escape).map(|t| (key.clone(), t))
            })
            .collect(),
    }
    .pruned()
}
