//! Semantic version suggestions from classified changes.

pub mod bump;

pub use bump::{calculate, dominant_bump, summarize, BumpType, ChangeCounts, SemVer, VersionBump};
