//! Registry data model.
//!
//! An [`Entry`] is one token at one collection/mode combination; a
//! [`Snapshot`] is the full registry at one point in time. Loose upstream
//! documents are checked once at the boundary ([`Snapshot::from_value`]) and
//! everything past that point works on these strict types.

pub mod entry;
pub mod snapshot;

pub use entry::{Entry, TokenValue, ValueType};
pub use snapshot::{ParsedSnapshot, SkippedEntry, Snapshot, SnapshotMetadata};
