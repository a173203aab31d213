//! Bridge CLI - Invoke, record and replay bridged applications.
//!
//! Commands:
//! - `bridge invoke` - Run one request through a demo application
//! - `bridge replay` - Re-run recordings and compare the event logs
//! - `bridge config` - Manage configuration

mod apps;
mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use bridge_observability::LogLevel;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ConfigArgs, InvokeArgs, ReplayArgs};

/// Bridge CLI - Drive applications through single-shot invocations
#[derive(Parser)]
#[command(name = "bridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Minimum level for the invocation log file (overrides config)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a demo application once
    Invoke(InvokeArgs),

    /// Replay recordings and report divergences
    Replay(ReplayArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Install the `tracing` subscriber. `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let mut ctx = context::Context::load(config_path, output)?;
    if let Some(level) = cli.log_level {
        ctx.config.log.level = level;
    }

    // Execute command
    let result = match cli.command {
        Commands::Invoke(args) => commands::invoke::run(args, &ctx).await,
        Commands::Replay(args) => commands::replay::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
