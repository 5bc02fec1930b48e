//! Engine configuration.
//!
//! Loaded from TOML; every key is optional and unknown keys are rejected.
//!
//! ```toml
//! max_chunk_size = 90000
//! alias_policy = "strict"
//! heuristic_matching = true
//! validate_new = true
//! log_profile = "production"
//! ```

use crate::codec::{ChunkCodec, DEFAULT_MAX_CHUNK_SIZE};
use crate::diff::matcher::EntityMatcher;
use crate::errors::{Result, TokenSyncError};
use crate::logging_facility::Profile;
use crate::policy::{AcceptancePolicy, AdvisoryAcceptancePolicy, StrictAcceptancePolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How alias findings on the new snapshot affect a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasPolicy {
    /// Broken or circular aliases abort the comparison
    Strict,
    /// Findings are reported only
    #[default]
    Advisory,
}

impl AliasPolicy {
    pub fn acceptance_policy(&self) -> &'static dyn AcceptancePolicy {
        match self {
            AliasPolicy::Strict => &StrictAcceptancePolicy,
            AliasPolicy::Advisory => &AdvisoryAcceptancePolicy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Characters per chunk for persisted payloads
    pub max_chunk_size: usize,
    pub alias_policy: AliasPolicy,
    /// Allow member-set, positional and path-based pairing
    pub heuristic_matching: bool,
    /// Run alias validation on the new snapshot during `compare`
    pub validate_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_profile: Option<Profile>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            alias_policy: AliasPolicy::default(),
            heuristic_matching: true,
            validate_new: true,
            log_profile: None,
        }
    }

    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    pub fn with_alias_policy(mut self, policy: AliasPolicy) -> Self {
        self.alias_policy = policy;
        self
    }

    pub fn with_heuristic_matching(mut self, enabled: bool) -> Self {
        self.heuristic_matching = enabled;
        self
    }

    pub fn with_validate_new(mut self, enabled: bool) -> Self {
        self.validate_new = enabled;
        self
    }

    pub fn with_log_profile(mut self, profile: Profile) -> Self {
        self.log_profile = Some(profile);
        self
    }

    /// # Errors
    /// * `Config` - malformed TOML, unknown key, or a zero chunk size
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(raw).map_err(|e| TokenSyncError::Config {
            message: e.to_string(),
        })?;
        config.validated()
    }

    /// # Errors
    /// * `Io` - file cannot be read
    /// * `Config` - see [`EngineConfig::from_toml_str`]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| TokenSyncError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    fn validated(self) -> Result<Self> {
        if self.max_chunk_size == 0 {
            return Err(TokenSyncError::Config {
                message: "max_chunk_size must be at least 1".to_string(),
            });
        }
        Ok(self)
    }

    pub fn chunk_codec(&self) -> Result<ChunkCodec> {
        ChunkCodec::new(self.max_chunk_size)
    }

    pub fn matcher(&self) -> EntityMatcher {
        EntityMatcher::new().with_heuristics(self.heuristic_matching)
    }

    pub fn acceptance_policy(&self) -> &'static dyn AcceptancePolicy {
        self.alias_policy.acceptance_policy()
    }
}
