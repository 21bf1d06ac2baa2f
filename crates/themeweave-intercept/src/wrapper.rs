//! Interception wrapper over a module's export surface.

use serde_json::Value;

use crate::callable::Callable;
use crate::error::CallError;

/// One named export of a module.
#[derive(Debug, Clone)]
pub enum Export {
    Function(Callable),
    Value(Value),
}

impl Export {
    /// True for function-valued exports.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Function(callable) => Some(callable),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Function(_) => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// Export surface whose callable entries run through the interception chain.
///
/// Built by [`InterceptionRegistry::wrap`](crate::InterceptionRegistry::wrap),
/// with one delegating entry per export name known when it was built.
#[derive(Debug, Clone)]
pub struct InterceptedModule {
    namespace: String,
    entries: Vec<(String, Export)>,
}

impl InterceptedModule {
    pub(crate) fn new(namespace: String, entries: Vec<(String, Export)>) -> Self {
        Self { namespace, entries }
    }

    /// Namespace used as the method-key prefix.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Read an export: callables come back routed, values unchanged.
    pub fn get(&self, name: &str) -> Option<&Export> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, export)| export)
    }

    /// Export names in declaration order.
    pub fn export_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Call the export `name` through its chain.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.callable(name)?.call(args).await
    }

    /// Call the export `name` through its chain without suspension.
    pub fn call_sync(&self, name: &str, args: Vec<Value>) -> Result<Value, CallError> {
        self.callable(name)?.call_sync(args)
    }

    fn callable(&self, name: &str) -> Result<&Callable, CallError> {
        match self.get(name) {
            Some(Export::Function(callable)) => Ok(callable),
            Some(Export::Value(_)) => Err(CallError::NotCallable(name.to_string())),
            None => Err(CallError::UnknownExport(name.to_string())),
        }
    }
}
