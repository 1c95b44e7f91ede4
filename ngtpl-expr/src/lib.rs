//! Expression language for templates: values, scopes, a pest-based parser and
//! a tree-walking interpreter.

mod ast;
mod engine;
mod error;
mod interp;
mod parser;
mod scope;
mod source;
mod value;

pub use ast::{BinaryOp, Expr, Lambda, Literal, UnaryOp};
pub use engine::{Engine, Interpreter};
pub use error::EvalError;
pub use interp::eval;
pub use parser::parse;
pub use scope::Scope;
pub use source::{AsyncSource, Deferred};
pub use value::{Function, NativeFn, Value, format_number};
