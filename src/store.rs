//! Patch Store: the persisted form of a documentation tree.
//!
//! One JSON document per top-level type, stored at
//! `<package path>/<Type>.docpatcher.json`. Text values are written as a
//! plain string when they fit on one line and as an array of lines
//! otherwise; empty members are left out entirely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{DocPatchError, Result};
use crate::model::{DocEntry, DocTree};

/// File name suffix of a patch document.
pub const SUFFIX: &str = ".docpatcher.json";

// -- Wire format --------------------------------------------------------------

/// A text value: one line as a scalar, several as an array of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum DocText {
    Line(String),
    Lines(Vec<String>),
}

impl From<&String> for DocText {
    fn from(text: &String) -> Self {
        if text.contains('\n') {
            DocText::Lines(text.split('\n').map(str::to_string).collect())
        } else {
            DocText::Line(text.clone())
        }
    }
}

impl From<DocText> for String {
    fn from(text: DocText) -> Self {
        match text {
            DocText::Line(line) => line,
            DocText::Lines(lines) => lines.join("\n"),
        }
    }
}

fn texts(values: &[String]) -> Vec<DocText> {
    values.iter().map(DocText::from).collect()
}

fn strings(values: Vec<DocText>) -> Vec<String> {
    values.into_iter().map(String::from).collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doc: Option<DocText>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, Vec<DocText>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<Vec<DocText>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    type_parameters: Option<Vec<DocText>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    clazz: Option<EntryRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    methods: BTreeMap<String, EntryRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, EntryRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    inner_classes: BTreeMap<String, TreeRecord>,
}

impl From<&DocEntry> for EntryRecord {
    fn from(entry: &DocEntry) -> Self {
        EntryRecord {
            doc: entry.body.as_ref().map(DocText::from),
            tags: entry
                .tags
                .iter()
                .map(|(name, values)| (name.clone(), texts(values)))
                .collect(),
            parameters: entry.parameters.as_deref().map(texts),
            type_parameters: entry.type_parameters.as_deref().map(texts),
        }
    }
}

impl From<EntryRecord> for DocEntry {
    fn from(record: EntryRecord) -> Self {
        DocEntry {
            body: record.doc.map(String::from),
            tags: record
                .tags
                .into_iter()
                .map(|(name, values)| (name, strings(values)))
                .collect(),
            parameters: record.parameters.map(strings),
            type_parameters: record.type_parameters.map(strings),
        }
    }
}

fn entries_to_records(entries: &BTreeMap<String, DocEntry>) -> BTreeMap<String, EntryRecord> {
    entries
        .iter()
        .map(|(key, entry)| (key.clone(), EntryRecord::from(entry)))
        .collect()
}

fn records_to_entries(records: BTreeMap<String, EntryRecord>) -> BTreeMap<String, DocEntry> {
    records
        .into_iter()
        .map(|(key, record)| (key, DocEntry::from(record)))
        .collect()
}

impl From<&DocTree> for TreeRecord {
    fn from(tree: &DocTree) -> Self {
        TreeRecord {
            clazz: tree.clazz.as_ref().map(EntryRecord::from),
            methods: entries_to_records(&tree.methods),
            fields: entries_to_records(&tree.fields),
            inner_classes: tree
                .inner_types
                .iter()
                .map(|(name, inner)| (name.clone(), TreeRecord::from(inner)))
                .collect(),
        }
    }
}

impl From<TreeRecord> for DocTree {
    fn from(record: TreeRecord) -> Self {
        DocTree {
            clazz: record.clazz.map(DocEntry::from),
            methods: records_to_entries(record.methods),
            fields: records_to_entries(record.fields),
            inner_types: record
                .inner_classes
                .into_iter()
                .map(|(name, inner)| (name, DocTree::from(inner)))
                .collect(),
        }
    }
}

/// Serialize a tree, pruning empty entries first.
pub fn to_json(tree: &DocTree) -> serde_json::Result<String> {
    let pruned = tree.clone().pruned().unwrap_or_default();
    let mut json = serde_json::to_string_pretty(&TreeRecord::from(&pruned))?;
    json.push('\n');
    Ok(json)
}

/// Parse a patch document. `None` when it holds no content.
pub fn from_json(json: &str) -> serde_json::Result<Option<DocTree>> {
    let record: TreeRecord = serde_json::from_str(json)?;
    Ok(DocTree::from(record).pruned())
}

// -- Stores -------------------------------------------------------------------

#[derive(Debug)]
enum Backing {
    Dir(PathBuf),
    Memory(RwLock<BTreeMap<String, DocTree>>),
}

/// Patch documents keyed by class name (`com/example/Widget`).
#[derive(Debug)]
pub struct PatchStore {
    backing: Backing,
}

impl PatchStore {
    /// A store over a directory of patch files. The directory need not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        PatchStore {
            backing: Backing::Dir(dir.into()),
        }
    }

    pub fn in_memory() -> Self {
        PatchStore {
            backing: Backing::Memory(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn load(&self, class_name: &str) -> Result<Option<DocTree>> {
        match &self.backing {
            Backing::Dir(root) => {
                let path = patch_file(root, class_name);
                if !path.is_file() {
                    return Ok(None);
                }
                let json = fs::read_to_string(&path).map_err(|e| DocPatchError::io(&path, e))?;
                from_json(&json).map_err(|source| DocPatchError::MalformedPatch { path, source })
            }
            Backing::Memory(map) => Ok(map
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .get(class_name)
                .cloned()),
        }
    }

    /// Store a tree; an empty tree removes any existing document instead.
    pub fn save(&self, class_name: &str, tree: &DocTree) -> Result<()> {
        match &self.backing {
            Backing::Dir(root) => {
                let path = patch_file(root, class_name);
                if tree.is_empty() {
                    if path.is_file() {
                        fs::remove_file(&path).map_err(|e| DocPatchError::io(&path, e))?;
                    }
                    return Ok(());
                }
                let json = to_json(tree).map_err(|source| DocPatchError::Encode {
                    path: path.clone(),
                    source,
                })?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| DocPatchError::io(parent, e))?;
                }
                fs::write(&path, json).map_err(|e| DocPatchError::io(&path, e))
            }
            Backing::Memory(map) => {
                let mut map = map.write().unwrap_or_else(|poisoned| poisoned.into_inner());
                match tree.clone().pruned() {
                    Some(tree) => map.insert(class_name.to_string(), tree),
                    None => map.remove(class_name),
                };
                Ok(())
            }
        }
    }

    /// Every class with a stored document, sorted.
    pub fn class_names(&self) -> Result<Vec<String>> {
        match &self.backing {
            Backing::Dir(root) => {
                if !root.is_dir() {
                    return Ok(Vec::new());
                }
                let mut names: Vec<String> = relative_files(root, SUFFIX)?;
                names.sort();
                Ok(names)
            }
            Backing::Memory(map) => Ok(map
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .keys()
                .cloned()
                .collect()),
        }
    }
}

fn patch_file(root: &Path, class_name: &str) -> PathBuf {
    root.join(format!("{}{}", class_name, SUFFIX))
}

/// Files below `root` ending in `suffix`, as `/`-separated relative paths
/// with the suffix removed.
pub(crate) fn relative_files(root: &Path, suffix: &str) -> Result<Vec<String>> {
    let pattern = format!(
        "{}/**/*{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        suffix
    );
    let paths = glob::glob(&pattern).map_err(|e| DocPatchError::Config {
        message: format!("invalid search pattern {}: {}", pattern, e),
    })?;

    let mut names = Vec::new();
    for path in paths.filter_map(|p| p.ok()).filter(|p| p.is_file()) {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if let Some(name) = relative.strip_suffix(suffix) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> DocTree {
        let mut method = DocEntry::with_body("Runs.\nTwice.");
        method
            .tags
            .insert("since".to_string(), vec!["1.0".to_string()]);
        method.parameters = Some(vec!["the count".to_string(), String::new()]);

        let mut inner = DocTree::default();
        inner
            .fields
            .insert("size".to_string(), DocEntry::with_body("The size."));

        let mut tree = DocTree {
            clazz: Some(DocEntry::with_body("A widget.")),
            ..Default::default()
        };
        tree.methods.insert("run(IJ)".to_string(), method);
        tree.inner_types.insert("Part".to_string(), inner);
        tree
    }

    #[test]
    fn multi_line_text_persists_as_array() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["clazz"]["doc"], "A widget.");
        assert_eq!(
            value["methods"]["run(IJ)"]["doc"],
            serde_json::json!(["Runs.", "Twice."])
        );
        assert_eq!(
            value["methods"]["run(IJ)"]["parameters"],
            serde_json::json!(["the count", ""])
        );
        assert_eq!(value["innerClasses"]["Part"]["fields"]["size"]["doc"], "The size.");
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn array_lines_join_on_read() {
        let json = r#"{"methods": {"run()": {"doc": ["a", "b"], "tags": {"return": [["x", "y"], "z"]}}}}"#;
        let tree = from_json(json).unwrap().unwrap();
        let entry = &tree.methods["run()"];
        assert_eq!(entry.body.as_deref(), Some("a\nb"));
        assert_eq!(entry.tags["return"], vec!["x\ny", "z"]);
    }

    #[test]
    fn round_trip_equals_pruned_tree() {
        let mut tree = sample();
        tree.fields.insert("empty".to_string(), DocEntry::default());
        let back = from_json(&to_json(&tree).unwrap()).unwrap().unwrap();
        assert_eq!(back, tree.pruned().unwrap());
    }

    #[test]
    fn empty_document_reads_as_none() {
        assert_eq!(from_json("{}").unwrap(), None);
        assert_eq!(
            from_json(r#"{"methods": {"run()": {"parameters": ["", ""]}}}"#).unwrap(),
            None
        );
    }

    #[test]
    fn empty_string_body_survives() {
        let mut tree = DocTree::default();
        tree.fields.insert("f".to_string(), DocEntry::with_body(""));
        let back = from_json(&to_json(&tree).unwrap()).unwrap().unwrap();
        assert_eq!(back.fields["f"].body.as_deref(), Some(""));
    }

    #[test]
    fn directory_store_mirrors_class_names() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::open(dir.path());
        store.save("com/example/Widget", &sample()).unwrap();
        assert!(dir
            .path()
            .join("com/example/Widget.docpatcher.json")
            .is_file());
        assert_eq!(store.class_names().unwrap(), vec!["com/example/Widget"]);
        assert_eq!(store.load("com/example/Widget").unwrap(), sample().pruned());
        assert_eq!(store.load("com/example/Missing").unwrap(), None);

        store.save("com/example/Widget", &DocTree::default()).unwrap();
        assert!(store.class_names().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Broken.docpatcher.json"), "{ nope").unwrap();
        let err = PatchStore::open(dir.path()).load("Broken").unwrap_err();
        assert!(matches!(err, DocPatchError::MalformedPatch { .. }));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = PatchStore::in_memory();
        store.save("Widget", &sample()).unwrap();
        assert_eq!(store.load("Widget").unwrap(), Some(sample()));
        assert_eq!(store.class_names().unwrap(), vec!["Widget"]);
    }

    #[test]
    fn glob_characters_in_the_root_are_literal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build[1]");
        let store = PatchStore::open(&root);
        store.save("com/example/Widget", &sample()).unwrap();
        assert_eq!(store.class_names().unwrap(), vec!["com/example/Widget"]);
        assert!(store.load("com/example/Widget").unwrap().is_some());
    }
}
