//! Method interception runtime.
//!
//! Holds before/around/after advice per fully-qualified method key
//! (`"<target>::<method>"`) and executes the composed chain around an
//! original callable. Values flowing through a chain are `serde_json::Value`.

pub mod callable;
pub mod chain;
pub mod error;
pub mod registry;
pub mod wrapper;

pub use callable::{Callable, Invocation};
pub use chain::Proceed;
pub use error::{CallError, InterceptError};
pub use registry::{Advice, AdviceChains, AdviceKind, InterceptionRegistry};
pub use wrapper::{Export, InterceptedModule};

/// Sort order applied when a registration does not specify one.
pub const DEFAULT_SORT_ORDER: i64 = 10;

/// Separator between a namespace and a method name in a method key.
pub const METHOD_KEY_SEPARATOR: &str = "::";

/// Build the method key for `method` on `namespace`.
pub fn method_key(namespace: &str, method: &str) -> String {
    format!("{}{}{}", namespace, METHOD_KEY_SEPARATOR, method)
}
