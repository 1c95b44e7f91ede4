/// Failure while parsing or running a template expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("syntax error in `{expression}`: {message}")]
    Syntax { expression: String, message: String },

    #[error("{name} is not defined")]
    UnknownIdentifier { name: String },

    #[error("cannot read property `{property}` of {target}")]
    NullishAccess { property: String, target: String },

    #[error("{callee} is not a function")]
    NotCallable { callee: String },

    #[error("type error: {0}")]
    Type(String),

    #[error("async source failed: {0}")]
    Async(String),
}
