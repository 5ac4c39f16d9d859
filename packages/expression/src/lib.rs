//! Expression support for Pado templates.
//!
//! - [`analyzer`] extracts the variables an expression depends on and
//!   rewrites loop item placeholders.
//! - [`evaluator`] interprets expressions against an [`EvalContext`].

pub mod analyzer;
pub mod ast;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod tokenizer;
pub mod value;

pub use analyzer::{
    brace_group_end, depends_on, expression_vars, replace_template_tokens, substitute_identifier,
    substitute_in_template, template_expressions, template_vars,
};
pub use ast::{BinaryOp, Expression, Span, UnaryOp};
pub use context::EvalContext;
pub use error::{ExprError, ExprResult};
pub use evaluator::{EvalOptions, Evaluator};
pub use parser::{parse, Parser};
pub use tokenizer::{tokenize, Token};
pub use value::Value;
