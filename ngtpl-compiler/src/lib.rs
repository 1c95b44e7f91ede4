//! Directive compiler for markup templates.
//!
//! A tree parsed into a [`ngtpl_dom::Document`] is rewritten in place:
//! `*ngif` and `*ngfor` prune and unroll nodes, `[attr]`, `[class.x]` and
//! `[style.prop]` bindings become plain attributes, `{{ expr }}` in text is
//! replaced by its value, and `ng-template` fragments are expanded wherever an
//! `ng-container *ngtemplateoutlet` names them.

mod attributes;
mod directive;
mod element;
mod error;
mod evaluator;
mod options;
mod template;

pub use directive::{Directive, FOR_ATTR, IF_ATTR, OUTLET_ATTR};
pub use element::interpolations;
pub use error::CompileError;
pub use evaluator::{Evaluator, EvaluatorFactory};
pub use options::CompileOptions;
pub use template::{Compiler, TemplateRegistry, compile_template};
