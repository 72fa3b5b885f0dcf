// Executor configuration

use crate::executor::error::ConfigError;
use crate::executor::path::is_absolute;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default creation mode for redirect targets (rw-r--r--)
pub const DEFAULT_REDIRECT_MODE: u32 = 0o644;

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shell used for command lines
    pub shell: PathBuf,
    /// Permission bits for files created by redirection
    pub redirect_mode: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            redirect_mode: DEFAULT_REDIRECT_MODE,
        }
    }
}

/// On-disk layout: settings live under an `[executor]` table
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    executor: ExecutorConfig,
}

impl ExecutorConfig {
    /// `~/.sysexec/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".sysexec").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".sysexec/config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.executor.validate()?;
        Ok(file.executor)
    }

    /// Load from a TOML file; a missing file yields the defaults
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), shell = %config.shell.display(), "loaded executor config");
        Ok(config)
    }

    /// Load `.env`, then apply `SYSEXEC_SHELL` and `SYSEXEC_REDIRECT_MODE`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(shell) = std::env::var("SYSEXEC_SHELL") {
            self.shell = PathBuf::from(shell);
        }

        if let Ok(mode) = std::env::var("SYSEXEC_REDIRECT_MODE") {
            match u32::from_str_radix(mode.trim_start_matches("0o"), 8) {
                Ok(parsed) => self.redirect_mode = parsed,
                Err(_) => {
                    warn!(var = "SYSEXEC_REDIRECT_MODE", value = %mode, "Invalid env var value, using default")
                }
            }
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_absolute(self.shell.to_str()) {
            return Err(ConfigError::Invalid(format!(
                "shell must be an absolute path, got '{}'",
                self.shell.display()
            )));
        }
        if self.redirect_mode & !0o7777 != 0 {
            return Err(ConfigError::Invalid(format!(
                "redirect_mode {:o} has bits outside 0o7777",
                self.redirect_mode
            )));
        }
        Ok(())
    }
}
