//! Application-level configuration for routers.

use serde::{Deserialize, Serialize};

/// What the router does after a handler fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Answer with `500 Internal Server Error` and finish normally.
    #[default]
    Respond,
    /// Answer with `500 Internal Server Error`, then return the failure.
    Propagate,
}

/// Configuration for a [`Router`](crate::Router).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Handler failure behavior.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl AppConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}
