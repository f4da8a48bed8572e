//! Batch runs over directories of parsed units.
//!
//! A unit is `<dir>/<package path>/<Type>.json`; its class name is the
//! relative path without the extension (`com/example/Widget`). Units are
//! processed in parallel and a failing unit never stops the others: its
//! error lands in the [`BatchReport`].

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diff::Differ;
use crate::error::{DocPatchError, Result};
use crate::inject::{ApplyOptions, Injector};
use crate::qualify::{Qualifier, SymbolTable};
use crate::reconcile::remainder;
use crate::source::SourceUnit;
use crate::store::{relative_files, PatchStore};

/// File extension of a parsed unit.
pub const UNIT_SUFFIX: &str = ".json";

#[derive(Debug)]
pub struct UnitFailure {
    pub unit: String,
    pub error: DocPatchError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Units attempted
    pub processed: usize,
    /// Output documents written
    pub written: usize,
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, unit: String, outcome: Result<bool>) {
        self.processed += 1;
        match outcome {
            Ok(true) => self.written += 1,
            Ok(false) => {}
            Err(error) => {
                tracing::error!(unit = %unit, "{}", error);
                self.failures.push(UnitFailure { unit, error });
            }
        }
    }
}

/// Class names of every unit under `dir`, sorted.
pub fn discover_units(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = relative_files(dir, UNIT_SUFFIX)?;
    names.sort();
    Ok(names)
}

pub fn unit_path(dir: &Path, class_name: &str) -> PathBuf {
    dir.join(format!("{}{}", class_name, UNIT_SUFFIX))
}

/// Read and parse one unit.
pub fn load_unit(dir: &Path, class_name: &str) -> Result<SourceUnit> {
    let path = unit_path(dir, class_name);
    let json = fs::read_to_string(&path).map_err(|e| DocPatchError::io(&path, e))?;
    serde_json::from_str(&json).map_err(|e| DocPatchError::ParseFailure {
        unit: class_name.to_string(),
        message: e.to_string(),
    })
}

/// Load units in parallel, keeping failures apart.
fn load_units(dir: &Path, names: &[String]) -> (Vec<(String, SourceUnit)>, Vec<(String, DocPatchError)>) {
    let loaded: Vec<(String, Result<SourceUnit>)> = names
        .par_iter()
        .map(|name| (name.clone(), load_unit(dir, name)))
        .collect();

    let mut units = Vec::new();
    let mut failures = Vec::new();
    for (name, result) in loaded {
        match result {
            Ok(unit) => units.push((name, unit)),
            Err(error) => failures.push((name, error)),
        }
    }
    (units, failures)
}

/// A symbol table over parsed units, `java.lang` and an optional external
/// symbol list.
pub fn symbol_table<'a>(
    units: impl IntoIterator<Item = &'a SourceUnit>,
    symbols: Option<&Path>,
) -> Result<SymbolTable> {
    let mut table = SymbolTable::new().with_java_lang();
    for unit in units {
        table.add_unit(unit);
    }
    if let Some(path) = symbols {
        let list = fs::read_to_string(path).map_err(|e| DocPatchError::io(path, e))?;
        table.add_external_list(&list);
    }
    tracing::debug!(symbols = table.len(), "symbol table ready");
    Ok(table)
}

fn clear_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| DocPatchError::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| DocPatchError::io(dir, e))
}

/// Diff every modified unit against its clean counterpart and write the
/// non-empty patches.
pub fn make_patches(
    clean_dir: &Path,
    modified_dir: &Path,
    patches_dir: &Path,
    symbols: Option<&Path>,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let names = discover_units(modified_dir)?;
    if names.is_empty() {
        tracing::info!("no units under {}, nothing to diff", modified_dir.display());
        return Ok(report);
    }
    clear_dir(patches_dir)?;

    let (modified, failures) = load_units(modified_dir, &names);
    for (name, error) in failures {
        report.record(name, Err(error));
    }

    let mut pending = Vec::new();
    for (name, unit) in modified {
        if unit_path(clean_dir, &name).is_file() {
            pending.push((name, unit));
        } else {
            let path = unit_path(clean_dir, &name);
            report.record(
                name.clone(),
                Err(DocPatchError::MissingCounterpart { unit: name, path }),
            );
        }
    }

    let pending_names: Vec<String> = pending.iter().map(|(name, _)| name.clone()).collect();
    let (clean, failures) = load_units(clean_dir, &pending_names);
    for (name, error) in failures {
        report.record(name, Err(error));
    }
    let mut clean: BTreeMap<String, SourceUnit> = clean.into_iter().collect();
    let pairs: Vec<(String, SourceUnit, SourceUnit)> = pending
        .into_iter()
        .filter_map(|(name, modified)| clean.remove(&name).map(|clean| (name, clean, modified)))
        .collect();

    let clean_table = symbol_table(pairs.iter().map(|(_, c, _)| c), symbols)?;
    let modified_table = symbol_table(pairs.iter().map(|(_, _, m)| m), symbols)?;
    let clean_qualifier = Qualifier::new(&clean_table);
    let modified_qualifier = Qualifier::new(&modified_table);
    let differ = Differ::new(&clean_qualifier, &modified_qualifier);
    let store = PatchStore::open(patches_dir);

    let outcomes: Vec<(String, Result<bool>)> = pairs
        .par_iter()
        .map(|(name, clean_unit, modified_unit)| {
            tracing::debug!(unit = %name, "diffing");
            let outcome = differ
                .diff_units(name, clean_unit, modified_unit)
                .and_then(|tree| match tree {
                    Some(tree) => store.save(name, &tree).map(|_| true),
                    None => Ok(false),
                });
            (name.clone(), outcome)
        })
        .collect();
    for (name, outcome) in outcomes {
        report.record(name, outcome);
    }

    tracing::info!(
        processed = report.processed,
        written = report.written,
        failed = report.failures.len(),
        "patches made"
    );
    Ok(report)
}

/// Document every unit under `source_dir` from the patches (and, per
/// `options`, the comments already there) and write the result.
pub fn apply_patches(
    source_dir: &Path,
    patches_dir: Option<&Path>,
    output_dir: &Path,
    options: &ApplyOptions,
    symbols: Option<&Path>,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let names = discover_units(source_dir)?;
    if names.is_empty() {
        tracing::info!("no units under {}, nothing to apply", source_dir.display());
        return Ok(report);
    }
    clear_dir(output_dir)?;

    let (units, failures) = load_units(source_dir, &names);
    for (name, error) in failures {
        report.record(name, Err(error));
    }

    let table = symbol_table(units.iter().map(|(_, u)| u), symbols)?;
    let qualifier = Qualifier::new(&table);
    let store = patches_dir.map(PatchStore::open);
    let injector = Injector::with_options(&qualifier, store.as_ref(), options);

    let outcomes: Vec<(String, Result<bool>)> = units
        .par_iter()
        .map(|(name, unit)| {
            tracing::debug!(unit = %name, "applying");
            let outcome = injector.inject(name, unit).and_then(|documented| {
                let path = unit_path(output_dir, name);
                let json = serde_json::to_string_pretty(&documented).map_err(|source| {
                    DocPatchError::Encode {
                        path: path.clone(),
                        source,
                    }
                })?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| DocPatchError::io(parent, e))?;
                }
                fs::write(&path, json + "\n").map_err(|e| DocPatchError::io(&path, e))?;
                Ok(true)
            });
            (name.clone(), outcome)
        })
        .collect();
    for (name, outcome) in outcomes {
        report.record(name, outcome);
    }

    tracing::info!(
        processed = report.processed,
        written = report.written,
        failed = report.failures.len(),
        "patches applied"
    );
    Ok(report)
}

/// Write the part of every patch that no longer attaches to `source_dir`.
/// Patches for units that are gone entirely are carried whole.
pub fn missed_patches(source_dir: &Path, patches_dir: &Path, missed_dir: &Path) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let patches = PatchStore::open(patches_dir);
    let names = patches.class_names()?;
    if names.is_empty() {
        tracing::info!("no patches under {}, nothing to reconcile", patches_dir.display());
        return Ok(report);
    }
    clear_dir(missed_dir)?;
    let missed = PatchStore::open(missed_dir);

    let outcomes: Vec<(String, Result<bool>)> = names
        .par_iter()
        .map(|name| (name.clone(), missed_for(source_dir, &patches, &missed, name)))
        .collect();
    for (name, outcome) in outcomes {
        report.record(name, outcome);
    }

    tracing::info!(
        processed = report.processed,
        written = report.written,
        failed = report.failures.len(),
        "missed patches collected"
    );
    Ok(report)
}

fn missed_for(source_dir: &Path, patches: &PatchStore, missed: &PatchStore, name: &str) -> Result<bool> {
    let Some(patch) = patches.load(name)? else {
        return Ok(false);
    };
    let rest = if unit_path(source_dir, name).is_file() {
        let unit = load_unit(source_dir, name)?;
        remainder(unit.single_type(name)?, &patch)
    } else {
        tracing::debug!(unit = %name, "unit is gone, carrying whole patch");
        Some(patch)
    };
    match rest {
        Some(rest) => missed.save(name, &rest).map(|_| true),
        None => Ok(false),
    }
}
