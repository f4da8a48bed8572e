//! docpatch: diff, persist and reapply javadoc between a clean and a
//! hand-documented copy of the same source tree.
//!
//! The pipeline:
//!
//! - [`diff`] aligns a clean and a modified tree by identity key and keeps
//!   only the documentation that changed;
//! - [`store`] persists that delta, one document per top-level type;
//! - [`inject`] merges stored patches (and optionally the comments already
//!   present) back onto a tree;
//! - [`reconcile`] finds patch content whose declaration has disappeared.
//!
//! Declaration trees come from an external parser as JSON ([`source`]).
//! Cross-references inside comments are canonicalized by [`qualify`].

pub mod batch;
pub mod config;
pub mod diff;
pub mod error;
pub mod inject;
pub mod keys;
pub mod model;
pub mod qualify;
pub mod reconcile;
pub mod source;
pub mod store;

pub use batch::{apply_patches, make_patches, missed_patches, BatchReport};
pub use config::Settings;
pub use diff::{extract_type, Differ};
pub use error::{DocPatchError, ErrorKind, Result};
pub use inject::{ApplyOptions, DocumentedType, Injector, Provider};
pub use model::{DocEntry, DocTree};
pub use qualify::{DocContext, Qualifier, SymbolTable, TypeInfo, TypeUniverse};
pub use reconcile::remainder;
pub use store::PatchStore;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `docpatch=info` filter; output goes to stderr.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docpatch=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}
