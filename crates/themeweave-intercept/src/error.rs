//! Error types for advice registration and chain execution.

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterceptError {
    /// The advice kind is not one of `before`, `around`, `after`.
    #[error("Invalid advice kind: {0}")]
    InvalidAdviceKind(String),
}

/// Errors raised while a chain is running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// A handler or the original callable failed.
    #[error("{0}")]
    Handler(String),

    /// An asynchronous callable was reached from a synchronous chain.
    #[error("asynchronous callable cannot run in a synchronous chain")]
    AsyncInSyncChain,

    /// An around advice asked for its continuation outside of an around chain.
    #[error("no continuation available for this invocation")]
    NoContinuation,

    /// The named export exists but holds a plain value.
    #[error("'{0}' is not a function")]
    NotCallable(String),

    /// The named export does not exist.
    #[error("no export named '{0}'")]
    UnknownExport(String),
}

impl CallError {
    /// Create a handler failure from any displayable message.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}
