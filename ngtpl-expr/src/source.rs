use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::error::EvalError;
use crate::value::Value;

/// A value that eventually produces exactly one result or fails.
///
/// Any scope value may carry this capability as [`Value::Async`]; evaluators
/// await it before handing the result back. `resolve` may be called more than
/// once and every call must yield the same outcome.
pub trait AsyncSource {
    fn resolve(&self) -> LocalBoxFuture<'static, Result<Value, EvalError>>;
}

/// An [`AsyncSource`] backed by a future, shared between every awaiting party.
#[derive(Clone)]
pub struct Deferred {
    inner: Shared<LocalBoxFuture<'static, Result<Value, EvalError>>>,
}

impl Deferred {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, EvalError>> + 'static,
    {
        Self {
            inner: future.boxed_local().shared(),
        }
    }

    /// A source that is already resolved.
    pub fn ready(value: impl Into<Value>) -> Self {
        Self::new(futures::future::ready(Ok(value.into())))
    }

    /// A source that fails with `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(futures::future::ready(Err(EvalError::Async(message.into()))))
    }

    pub fn into_value(self) -> Value {
        Value::Async(Rc::new(self))
    }
}

impl AsyncSource for Deferred {
    fn resolve(&self) -> LocalBoxFuture<'static, Result<Value, EvalError>> {
        self.inner.clone().boxed_local()
    }
}

impl From<Deferred> for Value {
    fn from(d: Deferred) -> Self {
        d.into_value()
    }
}
