use thiserror::Error;

/// Failure to fetch or evaluate a handler module
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Module not found: {src}")]
    NotFound { src: String },

    #[error("Failed to read module {src}: {message}")]
    Io { src: String, message: String },

    #[error("Invalid module {src}: {reason}")]
    Invalid { src: String, reason: String },
}

impl LoadError {
    pub fn not_found(src: impl Into<String>) -> Self {
        LoadError::NotFound { src: src.into() }
    }

    pub fn io(src: impl Into<String>, message: impl ToString) -> Self {
        LoadError::Io {
            src: src.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid(src: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadError::Invalid {
            src: src.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to dispatch an event to an installed handler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Element has no on{event} handler")]
    NoHandler { event: String },

    #[error("Malformed handler call: {call}")]
    MalformedCall { call: String },

    #[error("Unknown handler: {name}")]
    UnknownHandler { name: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
