//! Reconciliation: find patch content that no longer has a declaration to
//! attach to.

use crate::keys::MemberIndex;
use crate::model::DocTree;
use crate::source::TypeDecl;

/// Entries of `patch` whose keys are absent from `current`, recursively.
///
/// Nested types that still exist contribute only their own remainder; nested
/// types that are gone are carried whole. The type's own entry is never part
/// of the remainder.
pub fn remainder(current: &TypeDecl, patch: &DocTree) -> Option<DocTree> {
    let index = MemberIndex::new(current);

    DocTree {
        clazz: None,
        methods: patch
            .methods
            .iter()
            .filter(|(key, _)| !index.methods.contains_key(*key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect(),
        fields: patch
            .fields
            .iter()
            .filter(|(key, _)| !index.fields.contains_key(*key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect(),
        inner_types: patch
            .inner_types
            .iter()
            .filter_map(|(key, inner)| match index.nested.get(key) {
                Some(nested) => remainder(nested, inner).map(|rest| (key.clone(), rest)),
                None => Some((key.clone(), inner.clone())),
            })
            .collect(),
    }
    .pruned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{field_key, method_key};
    use crate::model::DocEntry;
    use crate::source::{FieldDecl, MethodDecl, Parameter};

    fn current() -> TypeDecl {
        TypeDecl {
            name: "Widget".to_string(),
            methods: vec![MethodDecl {
                name: "run".to_string(),
                parameters: vec![Parameter {
                    name: "n".to_string(),
                    erased_type: "long".to_string(),
                }],
                ..Default::default()
            }],
            fields: vec![FieldDecl {
                name: "size".to_string(),
                javadoc: None,
            }],
            nested_types: vec![TypeDecl {
                name: "Part".to_string(),
                fields: vec![FieldDecl {
                    name: "weight".to_string(),
                    javadoc: None,
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn patch() -> DocTree {
        let mut part = DocTree::default();
        part.fields.insert("weight".to_string(), DocEntry::with_body("Kept."));
        part.fields.insert("color".to_string(), DocEntry::with_body("Renamed."));

        let removed = DocTree {
            clazz: Some(DocEntry::with_body("Whole.")),
            ..Default::default()
        };

        let mut tree = DocTree {
            clazz: Some(DocEntry::with_body("A widget.")),
            ..Default::default()
        };
        tree.methods.insert("run(J)".to_string(), DocEntry::with_body("Runs."));
        tree.methods.insert("run(I)".to_string(), DocEntry::with_body("Old overload."));
        tree.fields.insert("size".to_string(), DocEntry::with_body("The size."));
        tree.inner_types.insert("Part".to_string(), part);
        tree.inner_types.insert("Removed".to_string(), removed);
        tree
    }

    #[test]
    fn orphaned_entries_remain() {
        let rest = remainder(&current(), &patch()).unwrap();
        assert_eq!(rest.clazz, None);
        assert_eq!(rest.methods.keys().collect::<Vec<_>>(), vec!["run(I)"]);
        assert!(rest.fields.is_empty());
        assert_eq!(
            rest.inner_types["Part"].fields.keys().collect::<Vec<_>>(),
            vec!["color"]
        );
        assert_eq!(rest.inner_types["Removed"], patch().inner_types["Removed"]);
    }

    #[test]
    fn fully_attached_patch_has_no_remainder() {
        let mut tree = DocTree {
            clazz: Some(DocEntry::with_body("A widget.")),
            ..Default::default()
        };
        tree.methods.insert("run(J)".to_string(), DocEntry::with_body("Runs."));
        assert_eq!(remainder(&current(), &tree), None);
    }

    #[test]
    fn remainder_keys_are_never_current_keys() {
        let ty = current();
        let rest = remainder(&ty, &patch()).unwrap();
        for method in &ty.methods {
            assert!(!rest.methods.contains_key(&method_key(method)));
        }
        for field in &ty.fields {
            assert!(!rest.fields.contains_key(&field_key(field)));
        }
        for key in patch().methods.keys() {
            let present = ty.methods.iter().any(|m| &method_key(m) == key);
            assert_eq!(rest.methods.contains_key(key), !present);
        }
    }
}
