//! Error types shared by the bridge crates.

use thiserror::Error;

/// Error raised by an application while it runs.
///
/// The bridge never converts or suppresses these: whatever the application
/// returns reaches the caller of `invoke` unchanged.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The application reported a failure.
    #[error("Application failed: {0}")]
    Failed(String),

    /// The application was driven in a way the protocol does not allow.
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApplicationError {
    /// Create a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Misuse of the scope/event protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unsupported scope type: {0}")]
    UnsupportedScope(String),

    #[error("Scope is missing required key '{0}'")]
    MissingScopeKey(&'static str),

    #[error("Unexpected inbound event '{0}'")]
    UnexpectedEvent(String),
}

/// Failure converting a JSON value into an [`Event`](crate::Event).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Event must be a JSON object")]
    NotAnObject,

    #[error("Event is missing its 'type' tag")]
    MissingType,

    #[error("Invalid event field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl EventError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
