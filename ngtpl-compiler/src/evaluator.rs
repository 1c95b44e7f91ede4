use std::rc::Rc;

use ngtpl_expr::{Engine, EvalError, Interpreter, Scope, Value};

/// Expression runner bound to one scope snapshot.
#[derive(Clone)]
pub struct Evaluator {
    scope: Scope,
    engine: Rc<dyn Engine>,
}

impl Evaluator {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run `code` and, when the result is an async source, wait for its value.
    pub async fn eval(&self, code: &str) -> Result<Value, EvalError> {
        match self.engine.execute(code, &self.scope)? {
            Value::Async(source) => {
                tracing::trace!(code, "awaiting async result");
                source.resolve().await
            }
            value => Ok(value),
        }
    }

    /// A new evaluator over this scope extended with `name`.
    pub fn bind(&self, name: &str, value: Value) -> Evaluator {
        Evaluator {
            scope: self.scope.with(name, value),
            engine: self.engine.clone(),
        }
    }
}

/// Builds [`Evaluator`]s that share one [`Engine`].
#[derive(Clone)]
pub struct EvaluatorFactory {
    engine: Rc<dyn Engine>,
}

impl Default for EvaluatorFactory {
    fn default() -> Self {
        Self::new(Interpreter::new())
    }
}

impl EvaluatorFactory {
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self {
            engine: Rc::new(engine),
        }
    }

    pub fn make(&self, scope: Scope) -> Evaluator {
        Evaluator {
            scope,
            engine: self.engine.clone(),
        }
    }
}
