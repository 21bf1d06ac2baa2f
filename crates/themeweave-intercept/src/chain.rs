//! Around-chain continuation.
//!
//! The first-registered around advice is outermost and the original callable
//! is innermost. Each level receives a `Proceed` pointing at the next level.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::callable::{Callable, Invocation};
use crate::error::CallError;
use crate::registry::Advice;

/// Continuation handed to an around advice.
///
/// Calling it runs the rest of the around chain and then the original
/// callable. Not calling it short-circuits everything beneath.
#[derive(Debug, Clone)]
pub struct Proceed {
    around: Arc<[Advice]>,
    depth: usize,
    original: Callable,
    this: Value,
}

impl Proceed {
    pub(crate) fn new(around: Vec<Advice>, original: Callable, this: Value) -> Self {
        Self {
            around: around.into(),
            depth: 0,
            original,
            this,
        }
    }

    fn next(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    /// Continue with `args`.
    pub fn call(&self, args: Vec<Value>) -> BoxFuture<'static, Result<Value, CallError>> {
        match self.around.get(self.depth) {
            Some(advice) => advice.handler.invoke(Invocation {
                this: self.this.clone(),
                args,
                proceed: Some(self.next()),
            }),
            None => self.original.invoke(Invocation::new(self.this.clone(), args)),
        }
    }

    /// Continue with `args` without suspension.
    pub fn call_sync(&self, args: Vec<Value>) -> Result<Value, CallError> {
        match self.around.get(self.depth) {
            Some(advice) => advice.handler.invoke_sync(Invocation {
                this: self.this.clone(),
                args,
                proceed: Some(self.next()),
            }),
            None => self.original.invoke_sync(Invocation::new(self.this.clone(), args)),
        }
    }

    /// Number of around levels still ahead of this continuation.
    pub fn remaining(&self) -> usize {
        self.around.len().saturating_sub(self.depth)
    }
}
