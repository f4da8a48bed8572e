//! `docpatch.toml` settings: discovery and loading.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DocPatchError, Result};
use crate::inject::ApplyOptions;

/// Name of the settings file looked up from the working directory upward.
pub const FILE_NAME: &str = "docpatch.toml";

/// Settings shared by all commands. Every path is optional here; commands
/// check for the ones they need after command-line overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Settings {
    /// Baseline source tree (parsed units)
    pub clean: Option<PathBuf>,
    /// Hand-documented source tree
    pub modified: Option<PathBuf>,
    /// Patch directory
    pub patches: Option<PathBuf>,
    /// Output directory for `apply`
    pub output: Option<PathBuf>,
    /// Output directory for `missed`
    pub missed: Option<PathBuf>,
    /// External symbol list, one qualified type name per line
    pub symbols: Option<PathBuf>,
    pub original_tag: Option<String>,
    pub keep_original: bool,
    pub sanitize_original: bool,
    pub simplify_references: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            clean: None,
            modified: None,
            patches: None,
            output: None,
            missed: None,
            symbols: None,
            original_tag: None,
            keep_original: true,
            sanitize_original: false,
            simplify_references: false,
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DocPatchError::Config {
            message: e.to_string(),
        })
    }

    /// Load a settings file. Relative paths are taken relative to the
    /// file's directory.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DocPatchError::io(path, e))?;
        let mut settings = Self::from_toml(&text).map_err(|e| DocPatchError::Config {
            message: format!("failed to load '{}': {}", path.display(), e),
        })?;
        if let Some(base) = path.parent() {
            settings.resolve_paths(base);
        }
        Ok(settings)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.clean,
            &mut self.modified,
            &mut self.patches,
            &mut self.output,
            &mut self.missed,
            &mut self.symbols,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Walk upward from `start` looking for [`FILE_NAME`].
    pub fn discover(start: &Path) -> Result<Option<PathBuf>> {
        let mut current = start
            .canonicalize()
            .map_err(|e| DocPatchError::io(start, e))?;
        loop {
            let candidate = current.join(FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("Found config: {}", candidate.display());
                return Ok(Some(candidate));
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok(None),
            }
        }
    }

    /// Load an explicit file, or the discovered one, or defaults when there
    /// is none.
    pub fn load(custom: Option<&Path>, start_dir: &Path) -> Result<Self> {
        match custom {
            Some(path) if !path.is_file() => Err(DocPatchError::Config {
                message: format!("config file not found: {}", path.display()),
            }),
            Some(path) => Self::load_from_file(path),
            None => match Self::discover(start_dir)? {
                Some(path) => Self::load_from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            keep_original: self.keep_original,
            original_tag: self.original_tag.clone(),
            sanitize_original: self.sanitize_original,
            simplify_references: self.simplify_references,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_keep_original() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.apply_options().keep_original);
    }

    #[test]
    fn kebab_case_keys() {
        let settings = Settings::from_toml(
            r#"
            patches = "patches"
            original-tag = "original"
            keep-original = false
            simplify-references = true
            "#,
        )
        .unwrap();
        assert_eq!(settings.patches, Some(PathBuf::from("patches")));
        let options = settings.apply_options();
        assert_eq!(options.original_tag.as_deref(), Some("original"));
        assert!(!options.keep_original);
        assert!(options.simplify_references);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_toml("patchez = \"x\"").unwrap_err();
        assert!(matches!(err, DocPatchError::Config { .. }));
    }

    #[test]
    fn discovery_walks_upward_and_resolves_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FILE_NAME), "clean = \"src/clean\"\n").unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let found = Settings::discover(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path().canonicalize().unwrap().join(FILE_NAME));

        let settings = Settings::load(None, &nested).unwrap();
        assert_eq!(
            settings.clean,
            Some(dir.path().canonicalize().unwrap().join("src/clean"))
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing), dir.path()).is_err());
    }
}
