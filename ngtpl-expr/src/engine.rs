use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Expr;
use crate::error::EvalError;
use crate::interp;
use crate::parser::parse;
use crate::scope::Scope;
use crate::value::Value;

/// Runs an expression string against a scope.
///
/// Every scope entry is addressable by name inside `code`. Implementations
/// return the raw result; awaiting [`Value::Async`] results is left to the
/// caller.
pub trait Engine {
    fn execute(&self, code: &str, scope: &Scope) -> Result<Value, EvalError>;
}

impl<F> Engine for F
where
    F: Fn(&str, &Scope) -> Result<Value, EvalError>,
{
    fn execute(&self, code: &str, scope: &Scope) -> Result<Value, EvalError> {
        self(code, scope)
    }
}

/// The built-in [`Engine`]: parses with the expression grammar and walks the AST.
///
/// Parsed expressions are cached by source text. Results never are.
#[derive(Default)]
pub struct Interpreter {
    cache: RefCell<HashMap<String, Rc<Expr>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(&self, code: &str) -> Result<Rc<Expr>, EvalError> {
        if let Some(expr) = self.cache.borrow().get(code) {
            return Ok(expr.clone());
        }
        let expr = Rc::new(parse(code)?);
        tracing::trace!(code, "parsed expression");
        self.cache
            .borrow_mut()
            .insert(code.to_string(), expr.clone());
        Ok(expr)
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl Engine for Interpreter {
    fn execute(&self, code: &str, scope: &Scope) -> Result<Value, EvalError> {
        if code.trim().is_empty() {
            return Ok(Value::Undefined);
        }
        let expr = self.compile(code)?;
        interp::eval(&expr, scope)
    }
}
