//! Launch policy engine for confidential container launchers.
//!
//! An image author declares, through image labels, which runtime overrides an
//! operator may apply when the workload container starts. This crate compiles
//! those labels into a [`LaunchPolicy`] and verifies an operator's
//! [`LaunchSpec`] against it.
//!
//! ```
//! use std::collections::HashMap;
//!
//! use launch_policy::{labels, EnvVar, LaunchPolicy, LaunchSpec};
//!
//! let image_labels = HashMap::from([
//!     (labels::ENV_OVERRIDE.to_owned(), "FOO,BAR".to_owned()),
//!     (labels::CMD_OVERRIDE.to_owned(), "false".to_owned()),
//! ]);
//! let policy = LaunchPolicy::from_labels(&image_labels)?;
//!
//! let spec = LaunchSpec {
//!     envs: vec![EnvVar::new("FOO", "1")],
//!     ..LaunchSpec::default()
//! };
//! assert!(policy.verify(&spec).is_ok());
//! # Ok::<(), launch_policy::InvalidLabel>(())
//! ```
//!
//! Both stages are pure: no I/O, no shared state, safe to call concurrently.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;

pub mod config;
pub mod error;
pub mod logging;
pub mod mount;
pub mod policy;
pub mod spec;
pub mod verify;

pub use error::{
    Capability, Error, InvalidLabel, MountCheckError, MountRejection, MountViolation,
    MountViolations, ParseLevelError, PolicyViolation, Rule,
};
pub use mount::path_allowed;
pub use policy::{compile, labels, LaunchPolicy, PolicyLevel};
pub use spec::{EnvVar, LaunchSpec, LogRedirectLocation, Mount};
pub use verify::verify;

/// Compile image labels and verify a launch spec in one step.
///
/// # Errors
///
/// Returns [`Error::InvalidLabel`] when the labels do not compile and
/// [`Error::Violation`] when the spec is not allowed.
pub fn check(
    image_labels: &HashMap<String, String>,
    spec: &LaunchSpec,
) -> Result<LaunchPolicy, Error> {
    let policy = LaunchPolicy::from_labels(image_labels)?;
    policy.verify(spec)?;
    Ok(policy)
}
