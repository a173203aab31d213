//! Bridge and route configuration.

use serde::{Deserialize, Serialize};

/// What the inbound supplier returns once the body has been handed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyDelivery {
    /// Deliver the body once, then `http.disconnect` on every later request.
    #[default]
    Once,
    /// Deliver the identical body event on every request.
    Repeat,
}

/// Configuration for a wrapped application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name used in logs and recordings.
    #[serde(default = "default_name")]
    pub name: String,
    /// Inbound body delivery mode.
    #[serde(default)]
    pub body_delivery: BodyDelivery,
}

fn default_name() -> String {
    "app".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            body_delivery: BodyDelivery::default(),
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the body delivery mode.
    pub fn with_body_delivery(mut self, delivery: BodyDelivery) -> Self {
        self.body_delivery = delivery;
        self
    }
}

/// Configuration for a single route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Exact request path (e.g. "/").
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_pattern() -> String {
    "/".to_string()
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            methods: default_methods(),
        }
    }
}

impl RouteConfig {
    /// Create a new route configuration accepting GET.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(String::from).collect();
        self
    }
}
