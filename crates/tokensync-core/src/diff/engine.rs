//! Comparison pipeline.
//!
//! The entry point is [`compare`]: identity, validation of the new
//! snapshot, matching, classification and the version decision, in that
//! order.

use crate::config::EngineConfig;
use crate::diff::classifier::classify;
use crate::diff::model::{Change, MatchResult};
use crate::errors::{Result, TokenSyncError};
use crate::model::Snapshot;
use crate::policy::AcceptancePolicy;
use crate::rules::{validate, ValidationResult};
use crate::version::{calculate, VersionBump};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, warn};

/// Content digests of both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffIdentity {
    pub old_digest: String,
    pub new_digest: String,
    pub old_entry_count: usize,
    pub new_entry_count: usize,
}

impl DiffIdentity {
    pub fn is_identical(&self) -> bool {
        self.old_digest == self.new_digest
    }
}

/// Everything a caller needs to present or act on a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison<'a> {
    pub identity: DiffIdentity,
    /// Alias findings on the new snapshot, when validation ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub match_warnings: Vec<String>,
    pub bump: VersionBump<'a>,
}

impl<'a> Comparison<'a> {
    pub fn changes(&self) -> &[Change<'a>] {
        &self.bump.changes
    }
}

/// Validate `snapshot` and let `policy` decide whether it is acceptable.
///
/// # Errors
/// * `PolicyDenied` - the policy refused the findings
pub fn accept_snapshot(
    snapshot: &Snapshot,
    policy: &dyn AcceptancePolicy,
) -> Result<ValidationResult> {
    log_op_start!("accept_snapshot", policy = policy.name());
    let start = Instant::now();

    let validation = validate(snapshot);
    if let Err(e) = policy.check(&validation) {
        log_op_error!(
            "accept_snapshot",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        return Err(e);
    }
    if !validation.valid {
        warn!(
            policy = policy.name(),
            error_count = validation.error_count,
            "accepting snapshot with alias findings"
        );
    }

    log_op_end!("accept_snapshot", duration_ms = start.elapsed().as_millis() as u64);
    Ok(validation)
}

/// Compare two snapshots and suggest the version that follows
/// `current_version`.
///
/// # Errors
/// * `Serialization` - a snapshot digest could not be computed
/// * `PolicyDenied` - strict alias policy and the new snapshot has findings
/// * `InvalidVersion` - `current_version` is not `major.minor.patch`
/// * `DeterminismViolation` - matching used an entry more than once
pub fn compare<'a>(
    old: &'a Snapshot,
    new: &'a Snapshot,
    current_version: &str,
    config: &EngineConfig,
) -> Result<Comparison<'a>> {
    log_op_start!("compare", old_entries = old.len(), new_entries = new.len());
    let start = Instant::now();

    let result = run_pipeline(old, new, current_version, config);
    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(comparison) => {
            log_op_end!(
                "compare",
                duration_ms = elapsed,
                change_count = comparison.changes().len(),
                bump = comparison.bump.change_type.as_str()
            );
        }
        Err(e) => {
            log_op_error!("compare", e.clone(), duration_ms = elapsed);
        }
    }
    result
}

fn run_pipeline<'a>(
    old: &'a Snapshot,
    new: &'a Snapshot,
    current_version: &str,
    config: &EngineConfig,
) -> Result<Comparison<'a>> {
    // 1. Identity
    let identity = DiffIdentity {
        old_digest: old.digest()?,
        new_digest: new.digest()?,
        old_entry_count: old.len(),
        new_entry_count: new.len(),
    };

    // 2. Gate the new data
    let validation = if config.validate_new {
        Some(accept_snapshot(new, config.acceptance_policy())?)
    } else {
        None
    };

    // 3. Fast path
    if identity.is_identical() {
        debug!(digest = %identity.new_digest, "snapshots identical");
        return Ok(Comparison {
            identity,
            validation,
            match_warnings: Vec::new(),
            bump: calculate(current_version, Vec::new())?,
        });
    }

    // 4. Match and classify
    let matched = config.matcher().match_snapshots(old, new);
    for warning in &matched.warnings {
        warn!(warning = %warning, "match warning");
    }
    ensure_one_to_one(&matched)?;
    let changes = classify(&matched);

    // 5. Version decision
    let bump = calculate(current_version, changes)?;

    Ok(Comparison {
        identity,
        validation,
        match_warnings: matched.warnings,
        bump,
    })
}

/// Every entry takes part in at most one pair or leftover on its side.
fn ensure_one_to_one(matched: &MatchResult<'_>) -> Result<()> {
    let mut old_seen = BTreeSet::new();
    let mut new_seen = BTreeSet::new();
    let olds = matched
        .matched_pairs
        .iter()
        .map(|p| ("old", p.old))
        .chain(matched.unmatched_old.iter().map(|&e| ("old", e)));
    let news = matched
        .matched_pairs
        .iter()
        .map(|p| ("new", p.new))
        .chain(matched.unmatched_new.iter().map(|&e| ("new", e)));

    let mut reused_old = olds.filter(|&(_, e)| !old_seen.insert(std::ptr::from_ref(e)));
    let mut reused_new = news.filter(|&(_, e)| !new_seen.insert(std::ptr::from_ref(e)));
    let reused = reused_old.next().or_else(|| reused_new.next());
    match reused {
        Some((side, entry)) => Err(TokenSyncError::DeterminismViolation {
            message: format!(
                "{side} entry '{}' was matched more than once",
                entry.display_address()
            ),
        }),
        None => Ok(()),
    }
}
