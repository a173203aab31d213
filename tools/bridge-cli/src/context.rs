//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::config::{CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration was loaded from, if anywhere.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            // Try to find config in current directory or parent directories
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        match &config_path {
            Some(path) => debug!(path = %path.display(), "Loaded config"),
            None => debug!("No config file found, using defaults"),
        }

        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get the recordings directory, creating it if needed.
    pub fn recordings_dir(&self) -> Result<PathBuf> {
        let recordings = self.resolve_path(&self.config.log.recordings);
        std::fs::create_dir_all(&recordings).with_context(|| {
            format!("Failed to create recordings directory: {}", recordings.display())
        })?;
        Ok(recordings)
    }

    /// Resolve a recording name or path to a file.
    pub fn recording_path(&self, recording: &str) -> Result<PathBuf> {
        let direct = self.resolve_path(recording);
        if direct.is_file() {
            return Ok(direct);
        }
        Ok(self.recordings_dir()?.join(format!("{}.json", recording)))
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_in(dir: &Path) -> Context {
        Context {
            config: CliConfig::default(),
            config_path: None,
            output: Output::new(false, true),
            cwd: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bridge.toml"), "[bridge]\nname = \"found\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, path) = Context::find_config(&nested).unwrap();

        assert_eq!(config.bridge.name, "found");
        assert_eq!(path, dir.path().join("bridge.toml"));
    }

    #[test]
    fn test_recording_path_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_in(dir.path());

        let path = ctx.recording_path("checkout").unwrap();

        assert_eq!(
            path,
            dir.path().join(".bridge").join("recordings").join("checkout.json")
        );
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_recording_path_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("saved.json");
        std::fs::write(&file, "{}").unwrap();
        let ctx = context_in(dir.path());

        assert_eq!(ctx.recording_path("saved.json").unwrap(), file);
    }
}
