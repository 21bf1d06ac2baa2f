//! Interception table and chain execution.
//!
//! Execution order for one call:
//! 1. before advice, ascending sort order; a returned array replaces the args
//! 2. around advice, first registered outermost
//! 3. the original callable, with the receiver bound
//! 4. after advice, ascending sort order; each gets `[result, ...original args]`

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::callable::{Callable, Invocation};
use crate::chain::Proceed;
use crate::error::{CallError, InterceptError};
use crate::wrapper::{Export, InterceptedModule};

/// Kind of advice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdviceKind {
    Before,
    Around,
    After,
}

impl AdviceKind {
    /// All kinds, in export-prefix matching order.
    pub const ALL: [AdviceKind; 3] = [AdviceKind::Before, AdviceKind::Around, AdviceKind::After];

    /// Lowercase name, also the export-name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Around => "around",
            Self::After => "after",
        }
    }
}

impl fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdviceKind {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Self::Before),
            "around" => Ok(Self::Around),
            "after" => Ok(Self::After),
            other => Err(InterceptError::InvalidAdviceKind(other.to_string())),
        }
    }
}

/// A registered advice.
#[derive(Debug, Clone)]
pub struct Advice {
    /// Declared advice name
    pub name: String,
    /// Handler invoked by the chain
    pub handler: Callable,
    /// Ascending execution order among advice of the same kind
    pub sort_order: i64,
}

/// Ordered advice lists for one method key.
#[derive(Debug, Clone, Default)]
pub struct AdviceChains {
    pub before: Vec<Advice>,
    pub around: Vec<Advice>,
    pub after: Vec<Advice>,
}

impl AdviceChains {
    /// The list for `kind`.
    pub fn list(&self, kind: AdviceKind) -> &[Advice] {
        match kind {
            AdviceKind::Before => &self.before,
            AdviceKind::Around => &self.around,
            AdviceKind::After => &self.after,
        }
    }

    fn list_mut(&mut self, kind: AdviceKind) -> &mut Vec<Advice> {
        match kind {
            AdviceKind::Before => &mut self.before,
            AdviceKind::Around => &mut self.around,
            AdviceKind::After => &mut self.after,
        }
    }

    /// True when no advice of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.around.is_empty() && self.after.is_empty()
    }
}

/// Per-method-key advice table.
///
/// Entries are append-only for the registry's lifetime.
#[derive(Debug, Default)]
pub struct InterceptionRegistry {
    table: RwLock<HashMap<String, AdviceChains>>,
}

impl InterceptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `kind` advice on `method_key`.
    ///
    /// The list for that kind stays sorted ascending by `sort_order`; equal
    /// sort orders keep registration order.
    pub fn add_advice(
        &self,
        method_key: &str,
        name: &str,
        kind: &str,
        handler: Callable,
        sort_order: i64,
    ) -> Result<(), InterceptError> {
        let kind: AdviceKind = kind.parse()?;

        let mut table = self.table.write();
        let list = table.entry(method_key.to_string()).or_default().list_mut(kind);
        list.push(Advice {
            name: name.to_string(),
            handler,
            sort_order,
        });
        list.sort_by_key(|advice| advice.sort_order);

        debug!(method_key, name, %kind, sort_order, "registered advice");
        Ok(())
    }

    /// Snapshot of the advice registered on `method_key`.
    pub fn chains(&self, method_key: &str) -> AdviceChains {
        self.table.read().get(method_key).cloned().unwrap_or_default()
    }

    /// True when `method_key` has any advice.
    pub fn is_intercepted(&self, method_key: &str) -> bool {
        self.table
            .read()
            .get(method_key)
            .is_some_and(|chains| !chains.is_empty())
    }

    /// Registered method keys, sorted.
    pub fn method_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.table.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Run the composed chain for `method_key` around `original`.
    pub async fn execute(
        &self,
        method_key: &str,
        original: &Callable,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        let chains = self.chains(method_key);
        let original_args = args.clone();
        let mut args = args;

        for advice in &chains.before {
            let returned = advice
                .handler
                .invoke(Invocation::new(this.clone(), args.clone()))
                .await?;
            if let Value::Array(replacement) = returned {
                args = replacement;
            }
        }

        let proceed = Proceed::new(chains.around.clone(), original.clone(), this.clone());
        let mut result = proceed.call(args).await?;

        for advice in &chains.after {
            result = advice
                .handler
                .invoke(Invocation::new(this.clone(), after_args(result, &original_args)))
                .await?;
        }

        Ok(result)
    }

    /// Same as [`execute`](Self::execute) without suspension.
    pub fn execute_sync(
        &self,
        method_key: &str,
        original: &Callable,
        this: Value,
        args: Vec<Value>,
    ) -> Result<Value, CallError> {
        let chains = self.chains(method_key);
        let original_args = args.clone();
        let mut args = args;

        for advice in &chains.before {
            let returned = advice
                .handler
                .invoke_sync(Invocation::new(this.clone(), args.clone()))?;
            if let Value::Array(replacement) = returned {
                args = replacement;
            }
        }

        let proceed = Proceed::new(chains.around, original.clone(), this.clone());
        let mut result = proceed.call_sync(args)?;

        for advice in &chains.after {
            result = advice
                .handler
                .invoke_sync(Invocation::new(this.clone(), after_args(result, &original_args)))?;
        }

        Ok(result)
    }

    /// Build an interception wrapper over `exports`.
    ///
    /// Every callable export becomes an entry routed through this registry
    /// under `"<namespace>::<export>"`. Plain values pass through unchanged.
    pub fn wrap(self: &Arc<Self>, exports: Vec<(String, Export)>, namespace: &str) -> InterceptedModule {
        let receiver = Value::Object(
            exports
                .iter()
                .filter_map(|(name, export)| match export {
                    Export::Value(value) => Some((name.clone(), value.clone())),
                    Export::Function(_) => None,
                })
                .collect(),
        );

        let entries = exports
            .into_iter()
            .map(|(name, export)| {
                let export = match export {
                    Export::Function(original) => Export::Function(Callable::routed(
                        Arc::clone(self),
                        crate::method_key(namespace, &name),
                        original,
                        receiver.clone(),
                    )),
                    value => value,
                };
                (name, export)
            })
            .collect();

        InterceptedModule::new(namespace.to_string(), entries)
    }
}

fn after_args(result: Value, original_args: &[Value]) -> Vec<Value> {
    let mut args = Vec::with_capacity(original_args.len() + 1);
    args.push(result);
    args.extend(original_args.iter().cloned());
    args
}
