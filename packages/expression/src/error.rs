use thiserror::Error;

pub type ExprResult<T> = Result<T, ExprError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Empty expression")]
    Empty,

    #[error("Unexpected character at {pos}")]
    LexerError { pos: usize },

    #[error("Unexpected token at {pos}: expected {expected}, found {found}")]
    UnexpectedToken {
        pos: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of expression at {pos}")]
    UnexpectedEof { pos: usize },

    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },

    #[error("Cannot read property '{property}' of {target}")]
    InvalidAccess { property: String, target: String },
}

impl ExprError {
    pub fn unexpected_token(pos: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            pos,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize) -> Self {
        Self::UnexpectedEof { pos }
    }

    pub fn lexer_error(pos: usize) -> Self {
        Self::LexerError { pos }
    }

    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into() }
    }

    pub fn invalid_access(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InvalidAccess {
            property: property.into(),
            target: target.into(),
        }
    }

    /// Whether the error was raised while turning source text into an AST
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            Self::Empty | Self::LexerError { .. } | Self::UnexpectedToken { .. } | Self::UnexpectedEof { .. }
        )
    }
}
