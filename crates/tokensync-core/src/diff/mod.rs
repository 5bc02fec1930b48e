//! Snapshot comparison: matching, classification and the pipeline that
//! ties them to a version decision.

pub mod classifier;
pub mod engine;
pub mod human_summary;
pub mod matcher;
pub mod model;

pub use classifier::classify;
pub use engine::{accept_snapshot, compare, Comparison, DiffIdentity};
pub use human_summary::render_human_summary;
pub use matcher::{match_snapshots, EntityMatcher};
pub use model::{
    Change, ChangeCategory, ChangeSubject, CollectionRename, MatchMethod, MatchResult,
    MatchedPair, ModeRename, Severity, StructuralItem,
};
