//! Configuration management commands.

use std::fs;

use anyhow::{bail, Context as _, Result};
use bridge_adapter::{Request, Router};
use chrono::Utc;
use dialoguer::Confirm;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("source", &path.display().to_string()),
        None => ctx.output.kv("source", "defaults"),
    }

    let config = &ctx.config;

    // Bridge section
    ctx.output.info("");
    ctx.output.info("[bridge]");
    ctx.output.kv("name", &config.bridge.name);
    ctx.output
        .kv("body_delivery", &format!("{:?}", config.bridge.body_delivery).to_lowercase());

    // App section
    ctx.output.info("");
    ctx.output.info("[app]");
    ctx.output.kv("demo", config.app.demo.name());
    ctx.output
        .kv("error_policy", &format!("{:?}", config.app.error_policy).to_lowercase());
    ctx.output.kv("route", &config.app.route.pattern);
    ctx.output.kv("methods", &config.app.route.methods.join(", "));

    // Log section
    ctx.output.info("");
    ctx.output.info("[log]");
    ctx.output.kv("level", &config.log.level.to_string().to_lowercase());
    ctx.output
        .kv("format", &format!("{:?}", config.log.format).to_lowercase());
    if let Some(ref file) = config.log.file {
        ctx.output.kv("file", file);
    }
    ctx.output.kv("recordings", &config.log.recordings);

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("bridge.toml");

    if config_path.exists() && !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Config init cancelled");
            return Ok(());
        }
    }

    let name = ctx
        .cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("app")
        .to_string();

    let content = format!(
        "# Created {}\n{}",
        Utc::now().format("%Y-%m-%d"),
        generate_default_config(&name)
    );
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check(&ctx.config, ctx);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Collect configuration errors and warnings.
fn check(config: &CliConfig, ctx: &Context) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.bridge.name.trim().is_empty() {
        errors.push("bridge.name must not be empty".to_string());
    }

    // Route problems surface exactly as the router reports them
    if let Err(e) = Router::new().mount(&config.app.route, |_request: Request| async { "" }) {
        errors.push(format!("app.route: {}", e));
    }

    if let Some(ref file) = config.log.file {
        let path = ctx.resolve_path(file);
        if path.parent().is_some_and(|dir| !dir.is_dir()) {
            errors.push(format!("log.file directory does not exist: {}", path.display()));
        }
    }

    if ctx.resolve_path(&config.log.recordings).is_file() {
        errors.push(format!("log.recordings is a file: {}", config.log.recordings));
    }

    if ctx.config_path.is_none() {
        warnings.push("No config file found, using defaults".to_string());
    }

    (errors, warnings)
}
