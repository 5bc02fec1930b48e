//! TokenSync Core - baseline reconciliation for design-token registries
//!
//! This crate compares two snapshots of a token registry and decides what
//! the difference means for consumers:
//! - Strict entry/snapshot model with boundary parsing of loose documents
//! - Size-limited chunk codec for persisted payloads
//! - Alias graph validation (broken references, cycles)
//! - Stable-id first entity matching with conservative heuristics
//! - Change classification and semantic version suggestions
//!
//! The engine is pure: no I/O besides optional config file loading, no
//! shared mutable state.

pub mod codec;
pub mod config;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod policy;
pub mod rules;
pub mod version;

// Re-export commonly used types
pub use codec::ChunkCodec;
pub use config::{AliasPolicy, EngineConfig};
pub use diff::{
    accept_snapshot, classify, compare, render_human_summary, Change, ChangeCategory, Comparison,
    EntityMatcher, MatchResult, Severity,
};
pub use errors::{ExError, ExErrorKind, Result, TokenSyncError};
pub use model::{Entry, Snapshot, TokenValue, ValueType};
pub use policy::{AcceptancePolicy, AdvisoryAcceptancePolicy, StrictAcceptancePolicy};
pub use rules::{validate, validate_value, ValidationResult};
pub use version::{calculate, BumpType, VersionBump};
