//! Error types for the handler adapter.

use thiserror::Error;

/// Errors building an application from handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// The method set was empty.
    #[error("At least one request method is required")]
    NoMethods,

    /// A method name is not a valid HTTP method token.
    #[error("Invalid request method: {0:?}")]
    InvalidMethod(String),

    /// Route paths must be absolute.
    #[error("Route path must start with '/': {0:?}")]
    InvalidPath(String),
}

/// A handler failed while producing its response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Handler failed: {message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
