//! Operator-supplied launch specification.
//!
//! A [`LaunchSpec`] is the set of runtime overrides an operator asks for when
//! starting the workload container. The launcher builds it from its own
//! configuration source; this crate only reads it.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Runtime overrides requested for one container launch.
///
/// Fields left out when deserializing take the [`Default`] values: no
/// overrides, on a hardened environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSpec {
    /// Environment variables to inject or override, in request order.
    pub envs: Vec<EnvVar>,
    /// Replacement command; empty keeps the image's own command.
    pub cmd: Vec<String>,
    /// Where container logs should be redirected.
    pub log_redirect: LogRedirectLocation,
    /// Whether memory usage monitoring is requested.
    pub memory_monitoring_enabled: bool,
    /// `true` on a hardened (production) environment, `false` on debug.
    /// Defaults to `true`; a debug environment must be stated explicitly.
    pub hardened: bool,
    /// Mounts to attach inside the container.
    pub mounts: Vec<Mount>,
}

impl Default for LaunchSpec {
    fn default() -> Self {
        Self {
            envs: Vec::new(),
            cmd: Vec::new(),
            log_redirect: LogRedirectLocation::default(),
            memory_monitoring_enabled: false,
            hardened: true,
            mounts: Vec::new(),
        }
    }
}

/// A single environment variable override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

impl EnvVar {
    /// Build an override from a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Destination of container log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRedirectLocation {
    /// Logs stay inside the container.
    #[default]
    Nowhere,
    /// Logs go to every supported sink.
    Everywhere,
    /// Logs go to the cloud logging service.
    CloudLogging,
    /// Logs go to the serial console.
    Serial,
}

impl LogRedirectLocation {
    /// Whether any redirection is requested.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Nowhere)
    }
}

/// A mount requested by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mount {
    /// In-memory filesystem.
    Tmpfs {
        /// Mount point inside the container.
        destination: PathBuf,
        /// Size limit in bytes; unset uses the runtime default.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size_bytes: Option<u64>,
    },
    /// Host path bound into the container.
    Bind {
        /// Host path.
        source: PathBuf,
        /// Mount point inside the container.
        destination: PathBuf,
    },
}

impl Mount {
    /// Tmpfs mount at `destination` with the default size.
    pub fn tmpfs(destination: impl Into<PathBuf>) -> Self {
        Self::Tmpfs {
            destination: destination.into(),
            size_bytes: None,
        }
    }

    /// Bind mount of `source` at `destination`.
    pub fn bind(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Bind {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Mount point inside the container.
    pub fn destination(&self) -> &Path {
        match self {
            Self::Tmpfs { destination, .. } | Self::Bind { destination, .. } => destination,
        }
    }
}
