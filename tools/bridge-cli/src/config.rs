//! CLI configuration.

use anyhow::{Context, Result};
use bridge_adapter::{AppConfig, ErrorPolicy};
use bridge_core::{BridgeConfig, RouteConfig};
use bridge_observability::{LogFormat, LogLevel};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Config file names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = ["bridge.toml", ".bridge.toml", "bridge.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Bridge configuration.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Demo application configuration.
    #[serde(default)]
    pub app: AppSection,

    /// Logging and recording configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Demo applications shipped with the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DemoApp {
    /// Echoes the request body back.
    #[default]
    Echo,
    /// Answers with a JSON greeting.
    Greet,
}

impl DemoApp {
    /// The name used in config files and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::Greet => "greet",
        }
    }
}

/// `[app]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSection {
    /// Application served by `invoke` and `replay`.
    #[serde(default)]
    pub demo: DemoApp,

    /// Route the greet handler is mounted on.
    #[serde(default)]
    pub route: RouteConfig,

    /// Handler failure behavior.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl AppSection {
    /// Router configuration for handler-based apps.
    pub fn app_config(&self) -> AppConfig {
        AppConfig::new().with_error_policy(self.error_policy)
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level for structured invocation logs.
    #[serde(default = "default_level")]
    pub level: LogLevel,

    /// Format of structured invocation logs.
    #[serde(default)]
    pub format: LogFormat,

    /// File receiving structured invocation logs. Disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Directory for recordings, relative to the working directory.
    #[serde(default = "default_recordings")]
    pub recordings: String,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

fn default_recordings() -> String {
    ".bridge/recordings".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
            recordings: default_recordings(),
        }
    }
}

/// Generate a default bridge.toml config file.
pub fn generate_default_config(name: &str) -> String {
    format!(
        r#"# Bridge configuration

[bridge]
name = "{name}"
# "once" hands the body over once, then reports a disconnect.
# "repeat" returns the same body event on every receive.
body_delivery = "once"

[app]
demo = "echo"
error_policy = "respond"

[app.route]
pattern = "/"
methods = ["GET", "POST"]

[log]
level = "info"
format = "json"
# file = "bridge.log"
recordings = ".bridge/recordings"
"#,
        name = name
    )
}
