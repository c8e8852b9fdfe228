//! Error types for label compilation and launch spec verification.
//!
//! Two kinds of failure exist:
//! - [`InvalidLabel`]: an image label is present but malformed. Always
//!   author-facing; the operator cannot fix it.
//! - [`PolicyViolation`]: an operator-supplied override is not permitted by
//!   the image's policy.
//!
//! Mount rules aggregate into [`MountViolations`] so every rejected
//! destination is reported at once.

use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Compile-time errors
// ---------------------------------------------------------------------------

/// A recognized image label carries a value outside its grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidLabel {
    /// The label must be a boolean.
    #[error("invalid image LABEL '{label}' (not a boolean: {value:?}); contact the image author")]
    NotBoolean {
        /// Label key.
        label: &'static str,
        /// Offending raw value.
        value: String,
    },

    /// The label must be one of the [`crate::policy::PolicyLevel`] tokens.
    #[error(
        "invalid image LABEL '{label}' (must be one of [always, never, debugonly], got {value:?}); contact the image author"
    )]
    NotPolicyLevel {
        /// Label key.
        label: &'static str,
        /// Offending raw value.
        value: String,
    },
}

impl InvalidLabel {
    /// The label key whose value failed to parse.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotBoolean { label, .. } | Self::NotPolicyLevel { label, .. } => label,
        }
    }

    /// The raw label value that failed to parse.
    pub fn value(&self) -> &str {
        match self {
            Self::NotBoolean { value, .. } | Self::NotPolicyLevel { value, .. } => value,
        }
    }
}

/// Returned by [`crate::policy::PolicyLevel`]'s `FromStr` when no token matches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid launch policy level {0:?} (must be one of [always, never, debugonly])")]
pub struct ParseLevelError(pub String);

// ---------------------------------------------------------------------------
// Verify-time errors
// ---------------------------------------------------------------------------

/// Rule of the verifier that produced a violation, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    /// Environment variable overrides.
    Env,
    /// Command override.
    Cmd,
    /// Log redirection.
    LogRedirect,
    /// Memory monitoring.
    MemoryMonitoring,
    /// Mount destinations.
    Mounts,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Env => "env",
            Self::Cmd => "cmd",
            Self::LogRedirect => "log-redirect",
            Self::MemoryMonitoring => "memory-monitoring",
            Self::Mounts => "mounts",
        };
        f.write_str(name)
    }
}

/// A runtime capability gated by a [`crate::policy::PolicyLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Container log redirection.
    LogRedirect,
    /// Memory usage monitoring.
    MemoryMonitoring,
}

impl Capability {
    /// Verifier rule that checks this capability.
    pub fn rule(self) -> Rule {
        match self {
            Self::LogRedirect => Rule::LogRedirect,
            Self::MemoryMonitoring => Rule::MemoryMonitoring,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LogRedirect => f.write_str("logging redirection"),
            Self::MemoryMonitoring => f.write_str("memory monitoring"),
        }
    }
}

/// An operator-supplied launch spec element is not allowed by the image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    /// An environment variable is not in the override allow-list.
    #[error(
        "env var {name} is not allowed to be overridden on this image; allowed envs to be overridden: {allowed:?}"
    )]
    EnvNotAllowed {
        /// Offending variable name.
        name: String,
        /// Names the image permits.
        allowed: Vec<String>,
    },

    /// The image does not permit replacing its command.
    #[error("CMD is not allowed to be overridden on this image")]
    CmdNotAllowed,

    /// The capability is disabled by a `never` policy.
    #[error("{0} not allowed by image")]
    CapabilityNotAllowed(Capability),

    /// The capability is `debugonly` and the environment is hardened.
    #[error("{0} only allowed on debug environment by image")]
    CapabilityDebugOnly(Capability),

    /// One or more mount destinations were rejected.
    #[error("destination mount points are not allowed: {0}")]
    Mounts(MountViolations),
}

impl PolicyViolation {
    /// The verifier rule this violation belongs to.
    pub fn rule(&self) -> Rule {
        match self {
            Self::EnvNotAllowed { .. } => Rule::Env,
            Self::CmdNotAllowed => Rule::Cmd,
            Self::CapabilityNotAllowed(cap) | Self::CapabilityDebugOnly(cap) => cap.rule(),
            Self::Mounts(_) => Rule::Mounts,
        }
    }
}

// ---------------------------------------------------------------------------
// Mount errors
// ---------------------------------------------------------------------------

/// Precondition failure of the containment checker.
///
/// Only absolute paths can be compared meaningfully, so a relative input is
/// an error rather than a silent rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountCheckError {
    /// The requested mount destination is relative.
    #[error("received a non-absolute destination path: {}", .0.display())]
    NonAbsoluteDestination(PathBuf),

    /// An allow-list entry is relative.
    #[error("received a non-absolute allowed destination path: {}", .0.display())]
    NonAbsoluteAllowed(PathBuf),
}

/// Why a single mount destination was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountRejection {
    /// The containment check could not be performed.
    Check(MountCheckError),
    /// The destination lies outside every allowed path.
    OutsideAllowed {
        /// The image's allowed destinations.
        allowed: Vec<PathBuf>,
    },
}

/// One rejected mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountViolation {
    /// Destination as requested by the operator.
    pub destination: PathBuf,
    /// Rejection reason.
    pub reason: MountRejection,
}

impl fmt::Display for MountViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MountRejection::Check(err) => fmt::Display::fmt(err, f),
            MountRejection::OutsideAllowed { allowed } => {
                let allowed: Vec<_> = allowed.iter().map(|p| p.display().to_string()).collect();
                write!(
                    f,
                    "destination mount point \"{}\" is invalid: policy only allows mounts in the following paths: {allowed:?}",
                    self.destination.display()
                )
            }
        }
    }
}

impl std::error::Error for MountViolation {}

/// Every rejected mount of one launch spec, in spec order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountViolations(Vec<MountViolation>);

impl MountViolations {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejected mount.
    pub fn push(&mut self, violation: MountViolation) {
        self.0.push(violation);
    }

    /// Whether no mount was rejected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rejected mounts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the rejected mounts.
    pub fn iter(&self) -> std::slice::Iter<'_, MountViolation> {
        self.0.iter()
    }

    /// Destinations of the rejected mounts, as requested.
    pub fn destinations(&self) -> Vec<&Path> {
        self.0.iter().map(|v| v.destination.as_path()).collect()
    }
}

impl fmt::Display for MountViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(violation, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for MountViolations {}

impl<'a> IntoIterator for &'a MountViolations {
    type Item = &'a MountViolation;
    type IntoIter = std::slice::Iter<'a, MountViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for MountViolations {
    type Item = MountViolation;
    type IntoIter = std::vec::IntoIter<MountViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Crate-level error
// ---------------------------------------------------------------------------

/// Either stage of [`crate::check`] failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Image labels did not compile.
    #[error(transparent)]
    InvalidLabel(#[from] InvalidLabel),

    /// The launch spec violates the compiled policy.
    #[error(transparent)]
    Violation(#[from] PolicyViolation),
}
