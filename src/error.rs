//! Error types for diffing, applying and reconciling documentation patches.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a clean/modified pair a declaration is missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Clean,
    Modified,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Clean => f.write_str("clean"),
            Side::Modified => f.write_str("modified"),
        }
    }
}

/// The kind of member an identity key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Field,
    NestedType,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Method => f.write_str("method"),
            MemberKind::Field => f.write_str("field"),
            MemberKind::NestedType => f.write_str("nested type"),
        }
    }
}

/// Main error type. Every variant is fatal for the unit being processed and
/// nothing else; batch runs collect them per unit.
#[derive(Debug, Error)]
pub enum DocPatchError {
    /// A key exists on only one side of a clean/modified pair
    #[error("{kind} `{key}` is missing from the {missing} tree (clean: {clean_type}, modified: {modified_type})")]
    AlignmentMismatch {
        kind: MemberKind,
        key: String,
        missing: Side,
        clean_type: String,
        modified_type: String,
    },

    /// Two declarations of one type produced the same identity key
    #[error("duplicate {kind} key `{key}` in {type_name}")]
    DuplicateKey {
        kind: MemberKind,
        key: String,
        type_name: String,
    },

    #[error("expected exactly one top-level type in {unit}, found {count}")]
    MultipleTypesInUnit { unit: String, count: usize },

    /// Modified unit has no clean file at the same relative path
    #[error("no clean counterpart for {unit}: {} does not exist", path.display())]
    MissingCounterpart { unit: String, path: PathBuf },

    #[error("failed to parse {unit}: {message}")]
    ParseFailure { unit: String, message: String },

    #[error("malformed patch file '{}': {source}", path.display())]
    MalformedPatch {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error for path '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Alignment,
    Unit,
    Parse,
    Io,
    Config,
}

impl DocPatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocPatchError::AlignmentMismatch { .. } | DocPatchError::DuplicateKey { .. } => {
                ErrorKind::Alignment
            }
            DocPatchError::MultipleTypesInUnit { .. } | DocPatchError::MissingCounterpart { .. } => {
                ErrorKind::Unit
            }
            DocPatchError::ParseFailure { .. } | DocPatchError::MalformedPatch { .. } => {
                ErrorKind::Parse
            }
            DocPatchError::Encode { .. } | DocPatchError::Io { .. } => ErrorKind::Io,
            DocPatchError::Config { .. } => ErrorKind::Config,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocPatchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, DocPatchError>;
