//! Launch spec verification against a compiled [`LaunchPolicy`].
//!
//! Rules are evaluated in a fixed order: env, cmd, log redirect, memory
//! monitoring, mounts. The scalar rules stop at the first violation. The mount
//! rule checks every mount and reports all rejected destinations together.

use tracing::debug;

use crate::error::{Capability, MountRejection, MountViolation, MountViolations, PolicyViolation};
use crate::mount::path_allowed;
use crate::policy::{LaunchPolicy, PolicyLevel};
use crate::spec::LaunchSpec;

impl LaunchPolicy {
    /// Verify a launch spec against this policy.
    ///
    /// # Errors
    ///
    /// Returns the first scalar [`PolicyViolation`] in rule order, or
    /// [`PolicyViolation::Mounts`] listing every rejected mount.
    pub fn verify(&self, spec: &LaunchSpec) -> Result<(), PolicyViolation> {
        let result = self.check_rules(spec);
        match &result {
            Ok(()) => debug!(hardened = spec.hardened, "launch spec allowed by policy"),
            Err(violation) => debug!(
                rule = %violation.rule(),
                hardened = spec.hardened,
                "launch spec rejected by policy"
            ),
        }
        result
    }

    fn check_rules(&self, spec: &LaunchSpec) -> Result<(), PolicyViolation> {
        if let Some(env) = spec.envs.iter().find(|env| !self.allows_env(&env.name)) {
            return Err(PolicyViolation::EnvNotAllowed {
                name: env.name.clone(),
                allowed: self.allowed_env_override.iter().cloned().collect(),
            });
        }

        if !self.allowed_cmd_override && !spec.cmd.is_empty() {
            return Err(PolicyViolation::CmdNotAllowed);
        }

        check_capability(
            Capability::LogRedirect,
            self.allowed_log_redirect,
            spec.log_redirect.is_enabled(),
            spec.hardened,
        )?;

        check_capability(
            Capability::MemoryMonitoring,
            self.allowed_memory_monitoring,
            spec.memory_monitoring_enabled,
            spec.hardened,
        )?;

        let violations = self.mount_violations(spec);
        if !violations.is_empty() {
            return Err(PolicyViolation::Mounts(violations));
        }

        Ok(())
    }

    fn mount_violations(&self, spec: &LaunchSpec) -> MountViolations {
        let mut violations = MountViolations::new();
        for mount in &spec.mounts {
            let destination = mount.destination();
            let reason = match path_allowed(&self.allowed_mount_destinations, destination) {
                Ok(true) => continue,
                Ok(false) => MountRejection::OutsideAllowed {
                    allowed: self.allowed_mount_destinations.clone(),
                },
                Err(err) => MountRejection::Check(err),
            };
            debug!(destination = %destination.display(), "mount destination rejected");
            violations.push(MountViolation {
                destination: destination.to_path_buf(),
                reason,
            });
        }
        violations
    }
}

/// Two-tier capability rule: `never` always rejects, `debugonly` rejects on
/// hardened environments, `always` never rejects.
fn check_capability(
    capability: Capability,
    level: PolicyLevel,
    requested: bool,
    hardened: bool,
) -> Result<(), PolicyViolation> {
    if !requested {
        return Ok(());
    }
    match level {
        PolicyLevel::Never => Err(PolicyViolation::CapabilityNotAllowed(capability)),
        PolicyLevel::DebugOnly if hardened => Err(PolicyViolation::CapabilityDebugOnly(capability)),
        PolicyLevel::DebugOnly | PolicyLevel::Always => Ok(()),
    }
}

/// Verify a launch spec against a compiled policy.
///
/// Shorthand for [`LaunchPolicy::verify`].
///
/// # Errors
///
/// See [`LaunchPolicy::verify`].
pub fn verify(policy: &LaunchPolicy, spec: &LaunchSpec) -> Result<(), PolicyViolation> {
    policy.verify(spec)
}
