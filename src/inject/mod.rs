//! Apply engine: combine documentation providers and produce the final
//! comment text for every declaration of a target tree.

pub mod original;
pub mod render;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::keys::MemberIndex;
use crate::model::{DocEntry, DocTree};
use crate::qualify::{DocContext, Qualifier};
use crate::source::{SourceUnit, TypeDecl};
use crate::store::PatchStore;

pub use render::render_comment;

/// Options for applying patches to a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Keep the comments already in the target tree as a fallback provider
    pub keep_original: bool,
    /// Wrap each original body in this tag instead of reading it as an entry
    pub original_tag: Option<String>,
    /// HTML-escape original content
    pub sanitize_original: bool,
    /// Shorten qualified references to what the target unit can see
    pub simplify_references: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            keep_original: true,
            original_tag: None,
            sanitize_original: false,
            simplify_references: false,
        }
    }
}

/// A source of documentation trees, queried per unit.
#[derive(Debug)]
pub enum Provider<'a> {
    /// Stored patches
    Patches(&'a PatchStore),
    /// Comments already present in the target tree
    Original { tag: Option<String>, escape: bool },
    /// Merge of several providers, highest priority first
    Combining(Vec<Provider<'a>>),
}

impl<'a> Provider<'a> {
    /// The provider chain described by `options`: patches first, then the
    /// preserved original when enabled.
    pub fn from_options(patches: Option<&'a PatchStore>, options: &ApplyOptions) -> Self {
        let mut chain = Vec::new();
        if let Some(store) = patches {
            chain.push(Provider::Patches(store));
        }
        if options.keep_original {
            chain.push(Provider::Original {
                tag: options.original_tag.clone(),
                escape: options.sanitize_original,
            });
        }
        Provider::Combining(chain)
    }

    pub fn tree(
        &self,
        qualifier: &Qualifier<'_>,
        class_name: &str,
        unit: &SourceUnit,
        ty: &TypeDecl,
    ) -> Result<Option<DocTree>> {
        match self {
            Provider::Patches(store) => store.load(class_name),
            Provider::Original { tag, escape } => Ok(original::original_tree(
                qualifier,
                unit,
                ty,
                tag.as_deref(),
                *escape,
            )),
            Provider::Combining(providers) => {
                let mut merged: Option<DocTree> = None;
                for provider in providers {
                    if let Some(tree) = provider.tree(qualifier, class_name, unit, ty)? {
                        merged = Some(match merged {
                            Some(higher) => higher.merge(&tree),
                            None => tree,
                        });
                    }
                }
                Ok(merged)
            }
        }
    }
}

/// Final comment text per declaration of one type. Declarations without
/// documentation are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentedType {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub inner_types: BTreeMap<String, DocumentedType>,
}

impl DocumentedType {
    pub fn is_empty(&self) -> bool {
        self.comment.is_none()
            && self.methods.is_empty()
            && self.fields.is_empty()
            && self.inner_types.is_empty()
    }
}

pub struct Injector<'a> {
    qualifier: &'a Qualifier<'a>,
    provider: Provider<'a>,
    simplify: bool,
}

impl<'a> Injector<'a> {
    pub fn new(qualifier: &'a Qualifier<'a>, provider: Provider<'a>) -> Self {
        Injector {
            qualifier,
            provider,
            simplify: false,
        }
    }

    pub fn with_options(
        qualifier: &'a Qualifier<'a>,
        patches: Option<&'a PatchStore>,
        options: &ApplyOptions,
    ) -> Self {
        Injector {
            qualifier,
            provider: Provider::from_options(patches, options),
            simplify: options.simplify_references,
        }
    }

    /// Merged documentation for a unit, before rendering.
    pub fn documentation(&self, class_name: &str, unit: &SourceUnit) -> Result<Option<DocTree>> {
        let ty = unit.single_type(class_name)?;
        self.provider.tree(self.qualifier, class_name, unit, ty)
    }

    /// Document every declaration of a unit.
    pub fn inject(&self, class_name: &str, unit: &SourceUnit) -> Result<DocumentedType> {
        let ty = unit.single_type(class_name)?;
        let tree = self
            .provider
            .tree(self.qualifier, class_name, unit, ty)?
            .unwrap_or_default();
        Ok(self.document(unit, ty, &tree, &unit.qualified_name(&[ty.name.as_str()])))
    }

    fn document(&self, unit: &SourceUnit, ty: &TypeDecl, tree: &DocTree, type_name: &str) -> DocumentedType {
        let ctx = DocContext::new(unit, ty);
        let index = MemberIndex::new(ty);
        let render = |entry: &DocEntry, parameters: &[String], type_parameters: &[String]| {
            let entry = if self.simplify {
                self.simplified(&ctx, entry)
            } else {
                entry.clone()
            };
            render_comment(&entry, parameters, type_parameters)
        };

        for key in tree.methods.keys().filter(|k| !index.methods.contains_key(*k)) {
            tracing::debug!(type_name, method = %key, "no declaration for patched method");
        }
        for key in tree.fields.keys().filter(|k| !index.fields.contains_key(*k)) {
            tracing::debug!(type_name, field = %key, "no declaration for patched field");
        }
        for key in tree.inner_types.keys().filter(|k| !index.nested.contains_key(*k)) {
            tracing::debug!(type_name, nested = %key, "no declaration for patched nested type");
        }

        let empty = DocTree::default();
        DocumentedType {
            name: ty.name.clone(),
            comment: tree.clazz.as_ref().map(|entry| {
                render(
                    entry,
                    &ty.parameter_names().unwrap_or_default(),
                    &ty.type_parameters,
                )
            }),
            methods: index
                .methods
                .iter()
                .filter_map(|(key, m)| {
                    let entry = tree.methods.get(key)?;
                    Some((key.clone(), render(entry, &m.parameter_names(), &m.type_parameters)))
                })
                .collect(),
            fields: index
                .fields
                .iter()
                .filter_map(|(key, _)| {
                    let entry = tree.fields.get(key)?;
                    Some((key.clone(), render(entry, &[], &[])))
                })
                .collect(),
            inner_types: index
                .nested
                .iter()
                .map(|(key, nested)| {
                    let inner_tree = tree.inner_types.get(key).unwrap_or(&empty);
                    let inner_name = format!("{}.{}", type_name, nested.name);
                    (key.clone(), self.document(unit, nested, inner_tree, &inner_name))
                })
                .filter(|(_, documented)| !documented.is_empty())
                .collect(),
        }
    }

    /// Rewrite references into the shortest form visible from `ctx`.
    fn simplified(&self, ctx: &DocContext<'_>, entry: &DocEntry) -> DocEntry {
        let expand = |text: &String| self.qualifier.expand(ctx, text, Some(ctx));
        DocEntry {
            body: entry.body.as_ref().map(expand),
            tags: entry
                .tags
                .iter()
                .map(|(name, values)| {
                    let values = values
                        .iter()
                        .map(|v| {
                            let v = self.qualifier.process_block_tag(name, ctx, v, Some(ctx));
                            expand(&v)
                        })
                        .collect();
                    (name.clone(), values)
                })
                .collect(),
            parameters: entry
                .parameters
                .as_ref()
                .map(|docs| docs.iter().map(expand).collect()),
            type_parameters: entry
                .type_parameters
                .as_ref()
                .map(|docs| docs.iter().map(expand).collect()),
        }
    }
}
