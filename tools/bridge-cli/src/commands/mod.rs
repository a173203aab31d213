//! CLI command implementations.

pub mod config;
pub mod invoke;
pub mod replay;

use std::fs::OpenOptions;

use anyhow::{Context as _, Result};
use bridge_observability::{LogObserver, ObserverSet, TracingObserver};
use clap::{Args, Subcommand};

use crate::config::DemoApp;
use crate::context::Context;

/// Observers attached to every invocation: `tracing` events, plus
/// structured lines in the configured log file.
pub fn observers(ctx: &Context) -> Result<ObserverSet> {
    let name = ctx.config.bridge.name.clone();
    let mut observers = ObserverSet::new().with(TracingObserver::new(name.clone()));

    if let Some(file) = &ctx.config.log.file {
        let path = ctx.resolve_path(file);
        let writer = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        observers = observers.with(
            LogObserver::new(writer)
                .with_app(name)
                .with_min_level(ctx.config.log.level)
                .with_format(ctx.config.log.format),
        );
    }

    Ok(observers)
}

/// Arguments for the invoke command.
#[derive(Args)]
pub struct InvokeArgs {
    /// Request method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request path.
    #[arg(short, long, default_value = "/")]
    pub path: String,

    /// Request header as "name: value" (repeatable).
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Raw query string, without the leading '?'.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Request body.
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file.
    #[arg(long)]
    pub body_file: Option<String>,

    /// Load the scope from a JSON file instead of --method/--path.
    #[arg(long)]
    pub scope: Option<String>,

    /// Demo application to run (default: from config).
    #[arg(short, long, value_enum)]
    pub app: Option<DemoApp>,

    /// Save the invocation as a named recording.
    #[arg(long)]
    pub record: Option<String>,
}

/// Arguments for the replay command.
#[derive(Args)]
pub struct ReplayArgs {
    /// Recording names or paths.
    #[arg(required = true)]
    pub recordings: Vec<String>,

    /// Demo application to replay against (default: from config).
    #[arg(short, long, value_enum)]
    pub app: Option<DemoApp>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Overwrite an existing config without asking.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
