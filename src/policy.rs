//! Launch policy compiled from image labels.
//!
//! The image author declares what an operator may override at launch time by
//! attaching labels to the image. [`LaunchPolicy::from_labels`] turns that flat
//! key/value mapping into a typed policy. Unrecognized labels are ignored and
//! absent labels keep their conservative defaults.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvalidLabel, ParseLevelError};
use crate::mount::clean_path;

/// Image label keys recognized by the policy compiler.
pub mod labels {
    /// Comma-separated environment variable names the operator may override.
    pub const ENV_OVERRIDE: &str = "tee.launch_policy.allow_env_override";
    /// Boolean: whether the operator may replace the image command.
    pub const CMD_OVERRIDE: &str = "tee.launch_policy.allow_cmd_override";
    /// Policy level for log redirection.
    pub const LOG_REDIRECT: &str = "tee.launch_policy.log_redirect";
    /// Policy level for memory monitoring.
    pub const MEMORY_MONITORING: &str = "tee.launch_policy.monitoring_memory_allow";
    /// `:`-separated list of allowed mount destinations.
    pub const MOUNT_DESTINATIONS: &str = "tee.launch_policy.allow_mount_destinations";

    /// All recognized keys, in the order they are compiled.
    pub const ALL: [&str; 5] = [
        ENV_OVERRIDE,
        CMD_OVERRIDE,
        LOG_REDIRECT,
        MEMORY_MONITORING,
        MOUNT_DESTINATIONS,
    ];
}

/// Separator of the mount destination path list.
const PATH_LIST_SEPARATOR: char = ':';

/// When a gated capability may be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLevel {
    /// Never allowed.
    Never,
    /// Allowed on debug environments only.
    #[default]
    DebugOnly,
    /// Always allowed.
    Always,
}

impl PolicyLevel {
    /// Label token for this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::DebugOnly => "debugonly",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyLevel {
    type Err = ParseLevelError;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "debugonly" => Ok(Self::DebugOnly),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}

/// What an operator may override when launching an image.
///
/// Built once per image by [`LaunchPolicy::from_labels`] and read-only
/// afterwards; verify specs against it with [`LaunchPolicy::verify`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchPolicy {
    /// Environment variable names the operator may set. Empty allows none.
    pub allowed_env_override: BTreeSet<String>,
    /// Whether the operator may replace the image command.
    pub allowed_cmd_override: bool,
    /// When log redirection is allowed.
    pub allowed_log_redirect: PolicyLevel,
    /// When memory monitoring is allowed.
    pub allowed_memory_monitoring: PolicyLevel,
    /// Lexically cleaned mount destinations. Empty allows no mounts.
    pub allowed_mount_destinations: Vec<PathBuf>,
}

impl LaunchPolicy {
    /// Compile image labels into a launch policy.
    ///
    /// Labels are compiled in the order of [`labels::ALL`]; the first
    /// malformed value aborts compilation.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLabel::NotBoolean`] when the command override label is
    /// not a boolean and [`InvalidLabel::NotPolicyLevel`] when a level label is
    /// not one of `always`, `never`, `debugonly`.
    pub fn from_labels(image_labels: &HashMap<String, String>) -> Result<Self, InvalidLabel> {
        let mut policy = Self::default();

        if let Some(value) = image_labels.get(labels::ENV_OVERRIDE) {
            policy.allowed_env_override = value
                .split(',')
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Some(value) = image_labels.get(labels::CMD_OVERRIDE) {
            policy.allowed_cmd_override =
                parse_bool(value).ok_or_else(|| InvalidLabel::NotBoolean {
                    label: labels::CMD_OVERRIDE,
                    value: value.clone(),
                })?;
        }

        if let Some(value) = image_labels.get(labels::LOG_REDIRECT) {
            policy.allowed_log_redirect = parse_level(labels::LOG_REDIRECT, value)?;
        }

        if let Some(value) = image_labels.get(labels::MEMORY_MONITORING) {
            policy.allowed_memory_monitoring = parse_level(labels::MEMORY_MONITORING, value)?;
        }

        if let Some(value) = image_labels.get(labels::MOUNT_DESTINATIONS) {
            policy.allowed_mount_destinations = value
                .split(PATH_LIST_SEPARATOR)
                .filter(|path| !path.is_empty())
                .map(|path| clean_path(Path::new(path)))
                .collect();
        }

        debug!(
            env_override = policy.allowed_env_override.len(),
            cmd_override = policy.allowed_cmd_override,
            log_redirect = %policy.allowed_log_redirect,
            memory_monitoring = %policy.allowed_memory_monitoring,
            mount_destinations = policy.allowed_mount_destinations.len(),
            "launch policy compiled"
        );

        Ok(policy)
    }

    /// Whether the operator may override the named environment variable.
    pub fn allows_env(&self, name: &str) -> bool {
        self.allowed_env_override.contains(name)
    }
}

impl fmt::Display for LaunchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let envs: Vec<&str> = self
            .allowed_env_override
            .iter()
            .map(String::as_str)
            .collect();
        let mounts: Vec<String> = self
            .allowed_mount_destinations
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(
            f,
            "env override: [{}], cmd override: {}, log redirect: {}, memory monitoring: {}, mount destinations: [{}]",
            envs.join(", "),
            self.allowed_cmd_override,
            self.allowed_log_redirect,
            self.allowed_memory_monitoring,
            mounts.join(", ")
        )
    }
}

/// Compile image labels into a launch policy.
///
/// Shorthand for [`LaunchPolicy::from_labels`].
///
/// # Errors
///
/// See [`LaunchPolicy::from_labels`].
pub fn compile(image_labels: &HashMap<String, String>) -> Result<LaunchPolicy, InvalidLabel> {
    LaunchPolicy::from_labels(image_labels)
}

fn parse_level(label: &'static str, value: &str) -> Result<PolicyLevel, InvalidLabel> {
    value
        .parse::<PolicyLevel>()
        .map_err(|_| InvalidLabel::NotPolicyLevel {
            label,
            value: value.to_owned(),
        })
}

/// Strict boolean grammar accepted for boolean labels.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
