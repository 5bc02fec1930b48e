use crate::diff::model::{Change, ChangeCategory, Severity};
use crate::errors::{Result, TokenSyncError};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Which version component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    None,
    Patch,
    Minor,
    Major,
}

impl BumpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BumpType::None => "none",
            BumpType::Patch => "patch",
            BumpType::Minor => "minor",
            BumpType::Major => "major",
        }
    }
}

impl From<Severity> for BumpType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Breaking => BumpType::Major,
            Severity::Addition => BumpType::Minor,
            Severity::Patch => BumpType::Patch,
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `MAJOR.MINOR.PATCH`, optionally written with a leading `v`.
///
/// Pre-release and build suffixes are rejected; registry baselines never
/// carry them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    prefixed: bool,
}

impl SemVer {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prefixed: false,
        }
    }

    /// Increment one component and zero everything to its right.
    pub fn bump(&self, bump: BumpType) -> Result<SemVer> {
        let overflow = || TokenSyncError::InvalidVersion {
            version: self.to_string(),
            reason: "component overflow".to_string(),
        };
        let (major, minor, patch) = match bump {
            BumpType::None => (self.major, self.minor, self.patch),
            BumpType::Patch => (
                self.major,
                self.minor,
                self.patch.checked_add(1).ok_or_else(overflow)?,
            ),
            BumpType::Minor => (self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0),
            BumpType::Major => (self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
        };
        Ok(SemVer {
            major,
            minor,
            patch,
            prefixed: self.prefixed,
        })
    }
}

impl FromStr for SemVer {
    type Err = TokenSyncError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |reason: &str| TokenSyncError::InvalidVersion {
            version: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        let (prefixed, body) = match trimmed.strip_prefix(['v', 'V']) {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let parts: Vec<&str> = body.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected MAJOR.MINOR.PATCH"));
        }
        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("component out of range"))?;
        }

        Ok(SemVer {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            prefixed,
        })
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefixed {
            f.write_str("v")?;
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Change counts per severity and per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub breaking: usize,
    pub additions: usize,
    pub patches: usize,
    pub by_category: BTreeMap<ChangeCategory, usize>,
}

impl ChangeCounts {
    pub fn from_changes(changes: &[Change<'_>]) -> Self {
        let mut counts = ChangeCounts::default();
        for change in changes {
            match change.severity {
                Severity::Breaking => counts.breaking += 1,
                Severity::Addition => counts.additions += 1,
                Severity::Patch => counts.patches += 1,
            }
            *counts.by_category.entry(change.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.breaking + self.additions + self.patches
    }
}

/// Suggested next version plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionBump<'a> {
    pub current: String,
    pub suggested: String,
    pub change_type: BumpType,
    pub changes: Vec<Change<'a>>,
    pub counts: ChangeCounts,
    pub summary: String,
}

/// Most severe change wins.
pub fn dominant_bump(changes: &[Change<'_>]) -> BumpType {
    changes
        .iter()
        .map(|c| BumpType::from(c.severity))
        .max()
        .unwrap_or(BumpType::None)
}

/// "1 breaking change, 2 additions"; "No changes detected" when empty.
pub fn summarize(counts: &ChangeCounts) -> String {
    let mut parts = Vec::new();
    if counts.breaking > 0 {
        parts.push(plural(counts.breaking, "breaking change", "breaking changes"));
    }
    if counts.additions > 0 {
        parts.push(plural(counts.additions, "addition", "additions"));
    }
    if counts.patches > 0 {
        parts.push(plural(counts.patches, "patch", "patches"));
    }
    if parts.is_empty() {
        "No changes detected".to_string()
    } else {
        parts.join(", ")
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

/// Suggest the next version for `current_version` given `changes`.
///
/// `current_version` is validated even when nothing changed.
pub fn calculate<'a>(current_version: &str, changes: Vec<Change<'a>>) -> Result<VersionBump<'a>> {
    log_op_start!("version_bump", change_count = changes.len());
    let start = Instant::now();

    let current = match current_version.parse::<SemVer>() {
        Ok(v) => v,
        Err(e) => {
            log_op_error!(
                "version_bump",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(e);
        }
    };

    let change_type = dominant_bump(&changes);
    let suggested = match change_type {
        BumpType::None => current_version.to_string(),
        bump => match current.bump(bump) {
            Ok(v) => v.to_string(),
            Err(e) => {
                log_op_error!(
                    "version_bump",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                return Err(e);
            }
        },
    };

    let counts = ChangeCounts::from_changes(&changes);
    let summary = summarize(&counts);

    log_op_end!("version_bump", duration_ms = start.elapsed().as_millis() as u64);

    Ok(VersionBump {
        current: current_version.to_string(),
        suggested,
        change_type,
        changes,
        counts,
        summary,
    })
}
