use pado_expression::ExprError;
use thiserror::Error;

/// Non-fatal problems found while compiling a template.
///
/// The offending span is left in the output unprocessed; `pos` is a byte
/// offset into the text being scanned at the time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileWarning {
    #[error("Unmatched {{@{directive}}} at {pos}: no closing {{/{directive}}}")]
    UnmatchedDirective { directive: String, pos: usize },

    #[error("Malformed {{@{directive}}} header at {pos}: {header}")]
    MalformedHeader {
        directive: String,
        header: String,
        pos: usize,
    },

    #[error("Branch {branch} is not allowed after {{@else}} in {group}")]
    BranchAfterElse { branch: String, group: String },

    #[error("Invalid expression `{expression}` in {location}: {error}")]
    InvalidExpression {
        expression: String,
        location: String,
        error: ExprError,
    },
}

impl CompileWarning {
    pub fn unmatched(directive: impl Into<String>, pos: usize) -> Self {
        Self::UnmatchedDirective {
            directive: directive.into(),
            pos,
        }
    }

    pub fn malformed(directive: impl Into<String>, header: impl Into<String>, pos: usize) -> Self {
        Self::MalformedHeader {
            directive: directive.into(),
            header: header.into(),
            pos,
        }
    }

    pub fn invalid_expression(expression: impl Into<String>, location: impl Into<String>, error: ExprError) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            location: location.into(),
            error,
        }
    }
}
