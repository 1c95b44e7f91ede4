use ngtpl_dom::DomError;
use ngtpl_expr::EvalError;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Dom(#[from] DomError),

    /// Loop unrolling and container unwrapping insert siblings, which needs a parent.
    #[error("<{tag}> has no parent to expand into")]
    Detached { tag: String },
}
