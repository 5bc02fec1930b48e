//! Acceptance policy for incoming snapshots.
//!
//! Alias findings are never errors by themselves. A policy decides whether
//! a snapshot with broken or circular aliases may become the new baseline.

use crate::errors::{Result, TokenSyncError};
use crate::rules::ValidationResult;

/// Decides whether a validated snapshot is acceptable.
pub trait AcceptancePolicy {
    /// Short name used in logs and denial messages
    fn name(&self) -> &'static str;

    /// # Errors
    /// * `PolicyDenied` - the snapshot must not be accepted
    fn check(&self, validation: &ValidationResult) -> Result<()>;
}

/// Refuses any snapshot with broken aliases or alias cycles.
///
/// # Example
/// ```
/// use tokensync_core::policy::{AcceptancePolicy, StrictAcceptancePolicy};
/// use tokensync_core::rules::ValidationResult;
///
/// let clean = ValidationResult {
///     valid: true,
///     ..ValidationResult::default()
/// };
/// assert!(StrictAcceptancePolicy.check(&clean).is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictAcceptancePolicy;

impl AcceptancePolicy for StrictAcceptancePolicy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn check(&self, validation: &ValidationResult) -> Result<()> {
        if validation.valid {
            return Ok(());
        }
        Err(TokenSyncError::PolicyDenied {
            policy: self.name().to_string(),
            reason: format!(
                "{} broken alias(es), {} circular reference(s)",
                validation.broken_aliases.len(),
                validation.circular_references.len()
            ),
        })
    }
}

/// Accepts everything; findings are reported but never block.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisoryAcceptancePolicy;

impl AcceptancePolicy for AdvisoryAcceptancePolicy {
    fn name(&self) -> &'static str {
        "advisory"
    }

    fn check(&self, _validation: &ValidationResult) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::BrokenAlias;

    fn broken() -> ValidationResult {
        ValidationResult {
            valid: false,
            broken_aliases: vec![BrokenAlias {
                token_path: "a".to_string(),
                alias_reference: "{missing}".to_string(),
                reference_path: "missing".to_string(),
            }],
            error_count: 1,
            ..ValidationResult::default()
        }
    }

    #[test]
    fn test_strict_denies_invalid() {
        let err = StrictAcceptancePolicy.check(&broken()).unwrap_err();
        assert_eq!(err.code(), "ERR_POLICY_DENIED");
        assert!(err.to_string().contains("1 broken alias(es)"));
    }

    #[test]
    fn test_advisory_accepts_invalid() {
        assert!(AdvisoryAcceptancePolicy.check(&broken()).is_ok());
    }
}
