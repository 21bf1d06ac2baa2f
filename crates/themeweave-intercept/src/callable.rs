//! Callable handles and the invocation passed to them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::chain::Proceed;
use crate::error::CallError;
use crate::registry::InterceptionRegistry;

type SyncFn = dyn Fn(Invocation) -> Result<Value, CallError> + Send + Sync;
type AsyncFn = dyn Fn(Invocation) -> BoxFuture<'static, Result<Value, CallError>> + Send + Sync;

/// One call into a callable.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Receiver bound as call context
    pub this: Value,

    /// Current argument list
    pub args: Vec<Value>,

    /// Continuation, present only for around advice
    pub proceed: Option<Proceed>,
}

impl Invocation {
    /// Create an invocation without a continuation.
    pub fn new(this: Value, args: Vec<Value>) -> Self {
        Self {
            this,
            args,
            proceed: None,
        }
    }

    /// Argument at `index`, or `Null` when absent.
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&Value::Null)
    }

    /// Argument at `index` as a string slice.
    pub fn arg_str(&self, index: usize) -> Option<&str> {
        self.arg(index).as_str()
    }

    /// The continuation of an around chain.
    pub fn proceed(&self) -> Result<&Proceed, CallError> {
        self.proceed.as_ref().ok_or(CallError::NoContinuation)
    }
}

/// A function-valued export, advice handler, or wrapper entry.
#[derive(Clone)]
pub struct Callable(Inner);

#[derive(Clone)]
enum Inner {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
    Routed(Arc<Route>),
}

/// A wrapper entry: calls go through the registry under `method_key`.
struct Route {
    registry: Arc<InterceptionRegistry>,
    method_key: String,
    original: Callable,
    receiver: Value,
}

impl Callable {
    /// Wrap a synchronous function.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Invocation) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        Self(Inner::Sync(Arc::new(f)))
    }

    /// Wrap an asynchronous function.
    pub fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallError>> + Send + 'static,
    {
        Self(Inner::Async(Arc::new(move |invocation| f(invocation).boxed())))
    }

    pub(crate) fn routed(
        registry: Arc<InterceptionRegistry>,
        method_key: String,
        original: Callable,
        receiver: Value,
    ) -> Self {
        Self(Inner::Routed(Arc::new(Route {
            registry,
            method_key,
            original,
            receiver,
        })))
    }

    /// Method key this callable dispatches through, for wrapper entries.
    pub fn method_key(&self) -> Option<&str> {
        match &self.0 {
            Inner::Routed(route) => Some(&route.method_key),
            _ => None,
        }
    }

    /// Whether this callable can only run in an asynchronous chain.
    pub fn is_async(&self) -> bool {
        matches!(self.0, Inner::Async(_))
    }

    /// Invoke, suspending only if the callable itself is asynchronous.
    pub fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, Result<Value, CallError>> {
        match &self.0 {
            Inner::Sync(f) => future::ready(f(invocation)).boxed(),
            Inner::Async(f) => f(invocation),
            Inner::Routed(route) => {
                let route = Arc::clone(route);
                async move {
                    route
                        .registry
                        .execute(
                            &route.method_key,
                            &route.original,
                            route.receiver.clone(),
                            invocation.args,
                        )
                        .await
                }
                .boxed()
            }
        }
    }

    /// Invoke without suspension.
    pub fn invoke_sync(&self, invocation: Invocation) -> Result<Value, CallError> {
        match &self.0 {
            Inner::Sync(f) => f(invocation),
            Inner::Async(_) => Err(CallError::AsyncInSyncChain),
            Inner::Routed(route) => route.registry.execute_sync(
                &route.method_key,
                &route.original,
                route.receiver.clone(),
                invocation.args,
            ),
        }
    }

    /// Call with a `Null` receiver.
    pub fn call(&self, args: Vec<Value>) -> BoxFuture<'static, Result<Value, CallError>> {
        self.invoke(Invocation::new(Value::Null, args))
    }

    /// Call synchronously with a `Null` receiver.
    pub fn call_sync(&self, args: Vec<Value>) -> Result<Value, CallError> {
        self.invoke_sync(Invocation::new(Value::Null, args))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Inner::Sync(_) => write!(f, "Callable::Sync"),
            Inner::Async(_) => write!(f, "Callable::Async"),
            Inner::Routed(route) => write!(f, "Callable::Routed({})", route.method_key),
        }
    }
}
