//! Configuration loading for the `launch-policy` command.
//!
//! Loads `~/.launch-policy/config.toml` (or `$LAUNCH_POLICY_CONFIG`).
//! Environment variables override file values; file values override defaults.
//!
//! The library itself takes no configuration: policies come from image labels
//! and specs from the caller. Only the CLI surface is configured here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LAUNCH_POLICY_CONFIG";
/// Environment override for [`LoggingConfig::level`].
pub const LOG_LEVEL_ENV: &str = "LAUNCH_POLICY_LOG";
/// Environment override for [`LoggingConfig::json`].
pub const LOG_JSON_ENV: &str = "LAUNCH_POLICY_LOG_JSON";
/// Environment override for [`LauncherConfig::hardened`].
pub const HARDENED_ENV: &str = "LAUNCH_POLICY_HARDENED";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Diagnostic output settings.
    pub logging: LoggingConfig,
    /// Launcher host settings.
    pub launcher: LauncherConfig,
}

/// Diagnostic output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Tracing filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

/// Launcher host settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Environment mode of this host. Applied to every verified launch spec;
    /// the operator's spec file cannot change it.
    pub hardened: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self { hardened: true }
    }
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// `path` overrides the default location. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the default location cannot be resolved.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path_with(env)?,
        };
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(env);
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests do not have to mutate the process
    /// environment. Unparsable values are ignored with a warning.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env(LOG_LEVEL_ENV) {
            self.logging.level = v;
        }
        if let Some(v) = env(LOG_JSON_ENV) {
            match v.parse() {
                Ok(b) => self.logging.json = b,
                Err(_) => tracing::warn!(var = LOG_JSON_ENV, value = %v, "ignoring invalid env override"),
            }
        }
        if let Some(v) = env(HARDENED_ENV) {
            match v.parse() {
                Ok(b) => self.launcher.hardened = b,
                Err(_) => tracing::warn!(var = HARDENED_ENV, value = %v, "ignoring invalid env override"),
            }
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has wrongly typed fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }
}

/// Resolve the default config directory (`~/.launch-policy/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".launch-policy"))
}

/// Resolve the config file path using a custom env resolver.
///
/// `$LAUNCH_POLICY_CONFIG` wins over `~/.launch-policy/config.toml`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(p) = env(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(p));
    }
    Ok(config_dir()?.join("config.toml"))
}
