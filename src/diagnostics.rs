//! Soft failures recorded during a build.
//!
//! Each entry is also emitted as a `tracing` warning.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

/// Category of a recorded soft failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Target identifier did not resolve through the component index
    UnresolvedTarget,
    /// Advice source identifier did not resolve
    UnresolvedAdvice,
    /// Export that should be a function is not
    NotCallable,
    /// Persisted component index missing; the index was rescanned
    CacheMiss,
    /// Theme or module config missing or unreadable
    ConfigLoad,
    /// Module loader failed
    LoadFailed,
    /// Interceptor declaration could not be interpreted
    InvalidDeclaration,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnresolvedTarget => "unresolved_target",
            Self::UnresolvedAdvice => "unresolved_advice",
            Self::NotCallable => "not_callable",
            Self::CacheMiss => "cache_miss",
            Self::ConfigLoad => "config_load",
            Self::LoadFailed => "load_failed",
            Self::InvalidDeclaration => "invalid_declaration",
        };
        f.write_str(s)
    }
}

/// One recorded soft failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub theme: String,
    pub message: String,
}

/// Append-only diagnostic log shared by a build session.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a soft failure and emit it as a warning.
    pub fn warn(&self, kind: DiagnosticKind, theme: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(%kind, theme, "{}", message);
        self.entries.lock().push(Diagnostic {
            kind,
            theme: theme.to_string(),
            message,
        });
    }

    /// All entries recorded so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Entries of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
