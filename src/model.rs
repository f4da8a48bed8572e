//! Documentation entries and trees: the unit of diffing, patching and persistence.

use std::collections::BTreeMap;

/// Documentation attached to one declaration.
///
/// `body == None` means "nothing to apply"; `Some("")` is real (empty) content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocEntry {
    pub body: Option<String>,
    /// Tag name → tag contents; contents keep comment order
    pub tags: BTreeMap<String, Vec<String>>,
    /// Per-parameter docs, positional; `""` means undocumented
    pub parameters: Option<Vec<String>>,
    /// Per-type-parameter docs, positional
    pub type_parameters: Option<Vec<String>>,
}

/// Documentation for one declared type and everything nested in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocTree {
    /// The type's own entry
    pub clazz: Option<DocEntry>,
    /// Method identity key → entry
    pub methods: BTreeMap<String, DocEntry>,
    /// Field name → entry
    pub fields: BTreeMap<String, DocEntry>,
    /// Nested type simple name → tree
    pub inner_types: BTreeMap<String, DocTree>,
}

fn has_content(values: &Option<Vec<String>>) -> bool {
    values
        .as_ref()
        .is_some_and(|v| v.iter().any(|s| !s.is_empty()))
}

/// Positional merge: `primary[i]` unless empty, then `fallback[i]`.
fn merge_positional(primary: &Option<Vec<String>>, fallback: &Option<Vec<String>>) -> Option<Vec<String>> {
    match (primary, fallback) {
        (None, None) => None,
        (Some(p), None) => Some(p.clone()),
        (None, Some(f)) => Some(f.clone()),
        (Some(p), Some(f)) => {
            let len = p.len().max(f.len());
            Some(
                (0..len)
                    .map(|i| {
                        let first = p.get(i).map(String::as_str).unwrap_or("");
                        if first.is_empty() {
                            f.get(i).cloned().unwrap_or_default()
                        } else {
                            first.to_string()
                        }
                    })
                    .collect(),
            )
        }
    }
}

impl DocEntry {
    pub fn with_body(body: impl Into<String>) -> Self {
        DocEntry {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
            && self.tags.values().all(Vec::is_empty)
            && !has_content(&self.parameters)
            && !has_content(&self.type_parameters)
    }

    /// Normalize: drop empty tag lists and all-empty parameter arrays;
    /// `None` if nothing is left.
    pub fn pruned(mut self) -> Option<Self> {
        self.tags.retain(|_, values| !values.is_empty());
        if !has_content(&self.parameters) {
            self.parameters = None;
        }
        if !has_content(&self.type_parameters) {
            self.type_parameters = None;
        }
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Combine with a lower-priority entry. Fields present here win; absent
    /// fields fall back; tag lists are concatenated (ours first).
    pub fn merge(&self, fallback: &DocEntry) -> DocEntry {
        let mut tags = self.tags.clone();
        for (name, values) in &fallback.tags {
            tags.entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        DocEntry {
            body: self.body.clone().or_else(|| fallback.body.clone()),
            tags,
            parameters: merge_positional(&self.parameters, &fallback.parameters),
            type_parameters: merge_positional(&self.type_parameters, &fallback.type_parameters),
        }
    }
}

fn merge_entries(
    primary: &BTreeMap<String, DocEntry>,
    fallback: &BTreeMap<String, DocEntry>,
) -> BTreeMap<String, DocEntry> {
    let mut out = primary.clone();
    for (key, entry) in fallback {
        match out.get_mut(key) {
            Some(existing) => *existing = existing.merge(entry),
            None => {
                out.insert(key.clone(), entry.clone());
            }
        }
    }
    out
}

impl DocTree {
    pub fn is_empty(&self) -> bool {
        self.clazz.as_ref().is_none_or(DocEntry::is_empty)
            && self.methods.values().all(DocEntry::is_empty)
            && self.fields.values().all(DocEntry::is_empty)
            && self.inner_types.values().all(DocTree::is_empty)
    }

    /// Recursively prune empty entries and subtrees; `None` if nothing is left.
    pub fn pruned(self) -> Option<Self> {
        let tree = DocTree {
            clazz: self.clazz.and_then(DocEntry::pruned),
            methods: self
                .methods
                .into_iter()
                .filter_map(|(k, e)| e.pruned().map(|e| (k, e)))
                .collect(),
            fields: self
                .fields
                .into_iter()
                .filter_map(|(k, e)| e.pruned().map(|e| (k, e)))
                .collect(),
            inner_types: self
                .inner_types
                .into_iter()
                .filter_map(|(k, t)| t.pruned().map(|t| (k, t)))
                .collect(),
        };
        if tree.clazz.is_none()
            && tree.methods.is_empty()
            && tree.fields.is_empty()
            && tree.inner_types.is_empty()
        {
            None
        } else {
            Some(tree)
        }
    }

    /// Combine with a lower-priority tree, entry by entry.
    pub fn merge(&self, fallback: &DocTree) -> DocTree {
        let clazz = match (&self.clazz, &fallback.clazz) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        let mut inner_types = self.inner_types.clone();
        for (name, tree) in &fallback.inner_types {
            match inner_types.get_mut(name) {
                Some(existing) => *existing = existing.merge(tree),
                None => {
                    inner_types.insert(name.clone(), tree.clone());
                }
            }
        }
        DocTree {
            clazz,
            methods: merge_entries(&self.methods, &fallback.methods),
            fields: merge_entries(&self.fields, &fallback.fields),
            inner_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(name: &str, values: &[&str]) -> DocEntry {
        let mut entry = DocEntry::default();
        entry
            .tags
            .insert(name.to_string(), values.iter().map(|s| s.to_string()).collect());
        entry
    }

    #[test]
    fn empty_string_body_is_content() {
        assert!(DocEntry::default().is_empty());
        assert!(!DocEntry::with_body("").is_empty());
    }

    #[test]
    fn all_empty_parameters_prune_away() {
        let entry = DocEntry {
            parameters: Some(vec![String::new(), String::new()]),
            ..Default::default()
        };
        assert!(entry.is_empty());
        assert_eq!(entry.pruned(), None);

        let kept = DocEntry {
            body: Some("x".to_string()),
            parameters: Some(vec![String::new()]),
            ..Default::default()
        }
        .pruned()
        .unwrap();
        assert_eq!(kept.parameters, None);
    }

    #[test]
    fn empty_inner_trees_prune_recursively() {
        let mut inner = DocTree::default();
        inner.methods.insert("run()".to_string(), DocEntry::default());
        let mut tree = DocTree::default();
        tree.inner_types.insert("Inner".to_string(), inner);
        assert!(tree.is_empty());
        assert_eq!(tree.pruned(), None);
    }

    #[test]
    fn merge_prefers_primary_body_and_concatenates_tags() {
        let mut patch = tagged("since", &["2.0"]);
        patch.body = Some("New text.".to_string());
        let mut original = tagged("since", &["1.0"]);
        original.body = Some("Old text.".to_string());
        original.tags.insert("author".to_string(), vec!["me".to_string()]);

        let merged = patch.merge(&original);
        assert_eq!(merged.body.as_deref(), Some("New text."));
        assert_eq!(merged.tags["since"], vec!["2.0", "1.0"]);
        assert_eq!(merged.tags["author"], vec!["me"]);
    }

    #[test]
    fn merge_falls_back_per_parameter() {
        let patch = DocEntry {
            parameters: Some(vec!["first".to_string(), String::new()]),
            ..Default::default()
        };
        let original = DocEntry {
            body: Some("Body.".to_string()),
            parameters: Some(vec!["old first".to_string(), "old second".to_string()]),
            ..Default::default()
        };
        let merged = patch.merge(&original);
        assert_eq!(merged.body.as_deref(), Some("Body."));
        assert_eq!(
            merged.parameters,
            Some(vec!["first".to_string(), "old second".to_string()])
        );
    }

    #[test]
    fn tree_merge_unions_members() {
        let mut a = DocTree::default();
        a.methods.insert("a()".to_string(), DocEntry::with_body("A"));
        let mut b = DocTree::default();
        b.methods.insert("a()".to_string(), DocEntry::with_body("ignored"));
        b.fields.insert("f".to_string(), DocEntry::with_body("F"));
        b.clazz = Some(DocEntry::with_body("Type."));

        let merged = a.merge(&b);
        assert_eq!(merged.methods["a()"].body.as_deref(), Some("A"));
        assert_eq!(merged.fields["f"].body.as_deref(), Some("F"));
        assert_eq!(merged.clazz.unwrap().body.as_deref(), Some("Type."));
    }
}
