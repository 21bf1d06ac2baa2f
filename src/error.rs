//! Error taxonomy for resolution and interceptor builds.
//!
//! Soft misses (unresolved identifiers, unreadable per-theme config, load
//! failures) never surface here; they are recorded as diagnostics. Everything
//! in this enum aborts the enclosing build step.

use std::io;
use std::path::PathBuf;

use themeweave_intercept::InterceptError;

use crate::catalog::CatalogError;

/// Hard failures
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Catalog error: {0}")]
    CatalogLoad(#[from] CatalogError),

    #[error("duplicate component \"{key}\": {}", .path.display())]
    DuplicateComponentKey { key: String, path: PathBuf },

    #[error("Component index artifact not found: {}", .0.display())]
    MissingIndexArtifact(PathBuf),

    #[error(
        "Advice {advice} ({advice_source}) exports '{export}' but target {target} does not export '{method}'"
    )]
    ExportMismatch {
        /// Declared advice name
        advice: String,
        /// Advice source identifier
        advice_source: String,
        /// Offending export of the advice module
        export: String,
        /// Target identifier
        target: String,
        /// Method name derived from the export
        method: String,
    },

    #[error(transparent)]
    InvalidAdviceKind(#[from] InterceptError),

    #[error("Scan error: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
