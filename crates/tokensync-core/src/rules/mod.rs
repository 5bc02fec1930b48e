//! Integrity rules applied to a single snapshot.

pub mod alias_graph;

pub use alias_graph::{
    validate, validate_value, BrokenAlias, CircularReference, ValidationResult,
};
