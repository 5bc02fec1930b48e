//! Alias reference integrity: every alias resolves, and no alias chain loops.
//!
//! The graph's nodes are token paths; an edge `a → b` exists when any entry
//! at path `a` (in any mode) has the value `{b}`. Cycle detection walks this
//! graph with an explicit stack so deep chains cannot exhaust the call stack.

use crate::model::{Entry, Snapshot};
use crate::{log_op_end, log_op_start};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// An alias whose target path does not exist in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenAlias {
    /// Path of the entry holding the alias
    pub token_path: String,
    /// Raw alias value, braces included
    pub alias_reference: String,
    /// Path the alias points at
    pub reference_path: String,
}

/// A loop of alias references, first node repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularReference {
    pub path: Vec<String>,
}

impl CircularReference {
    pub fn contains(&self, token_path: &str) -> bool {
        self.path.iter().any(|p| p == token_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub broken_aliases: Vec<BrokenAlias>,
    pub circular_references: Vec<CircularReference>,
    pub error_count: usize,
    /// Non-fatal notes: skipped entries, unusable documents
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn from_findings(
        broken_aliases: Vec<BrokenAlias>,
        circular_references: Vec<CircularReference>,
        warnings: Vec<String>,
    ) -> Self {
        let error_count = broken_aliases.len() + circular_references.len();
        Self {
            valid: error_count == 0,
            broken_aliases,
            circular_references,
            error_count,
            warnings,
        }
    }

    fn invalid_document(reason: String) -> Self {
        Self {
            valid: false,
            broken_aliases: Vec::new(),
            circular_references: Vec::new(),
            error_count: 0,
            warnings: vec![reason],
        }
    }
}

/// Validate alias references of one snapshot.
pub fn validate(snapshot: &Snapshot) -> ValidationResult {
    log_op_start!("validate", entry_count = snapshot.len() as u64);
    let start = std::time::Instant::now();

    let result = validate_entries(snapshot.entries.values(), Vec::new());

    log_op_end!(
        "validate",
        duration_ms = start.elapsed().as_millis() as u64,
        valid = result.valid,
        error_count = result.error_count as u64
    );
    result
}

/// Validate an unparsed snapshot document.
///
/// A document without the required structure yields `valid = false` with a
/// warning instead of an error; malformed entries are skipped and noted.
pub fn validate_value(raw: &Value) -> ValidationResult {
    match Snapshot::from_value(raw) {
        Ok(parsed) => {
            let warnings = parsed
                .skipped
                .iter()
                .map(|s| format!("skipped entry `{}`: {}", s.key, s.reason))
                .collect();
            let result = validate_entries(parsed.snapshot.entries.values(), warnings);
            tracing::debug!(
                valid = result.valid,
                skipped = parsed.skipped.len() as u64,
                "validated raw snapshot document"
            );
            result
        }
        Err(e) => {
            tracing::warn!(error = %e, "snapshot document rejected before validation");
            ValidationResult::invalid_document(e.to_string())
        }
    }
}

fn validate_entries<'a, I>(entries: I, warnings: Vec<String>) -> ValidationResult
where
    I: Iterator<Item = &'a Entry> + Clone,
{
    let graph = AliasGraph::build(entries.clone());

    let broken_aliases = entries
        .filter_map(|entry| {
            let target = entry.value.alias_target()?;
            if graph.contains(target) {
                return None;
            }
            Some(BrokenAlias {
                token_path: entry.path.clone(),
                alias_reference: entry.value.to_string(),
                reference_path: target.to_string(),
            })
        })
        .collect();

    let circular_references = graph.find_cycles();

    ValidationResult::from_findings(broken_aliases, circular_references, warnings)
}

/// Path-level adjacency built from alias values.
struct AliasGraph<'a> {
    /// Every known path, with its alias targets (empty for literal values)
    edges: BTreeMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> AliasGraph<'a> {
    fn build<I: Iterator<Item = &'a Entry>>(entries: I) -> Self {
        let mut edges: BTreeMap<&'a str, BTreeSet<&'a str>> = BTreeMap::new();
        for entry in entries {
            let targets = edges.entry(entry.path.as_str()).or_default();
            if let Some(target) = entry.value.alias_target() {
                targets.insert(target);
            }
        }
        Self { edges }
    }

    fn contains(&self, path: &str) -> bool {
        self.edges.contains_key(path)
    }

    fn targets(&self, path: &str) -> impl Iterator<Item = &'a str> + '_ {
        self.edges
            .get(path)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
            .filter(|target| self.edges.contains_key(target))
    }

    /// Targets in pop order, so they are explored in ascending path order
    fn pending_targets(&self, path: &str) -> Vec<&'a str> {
        let mut targets: Vec<&'a str> = self.targets(path).collect();
        targets.reverse();
        targets
    }

    /// Depth-first search over every alias-bearing path.
    ///
    /// `visited` holds fully processed nodes, `on_stack` the current chain.
    /// Reaching a node on the current chain records the loop once.
    fn find_cycles(&self) -> Vec<CircularReference> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<&'a str> = HashSet::new();

        for (&root, targets) in &self.edges {
            if targets.is_empty() || visited.contains(root) {
                continue;
            }

            let mut on_stack: HashSet<&'a str> = HashSet::new();
            let mut chain: Vec<&'a str> = Vec::new();
            let mut frames: Vec<(&'a str, Vec<&'a str>)> = Vec::new();

            on_stack.insert(root);
            chain.push(root);
            frames.push((root, self.pending_targets(root)));

            while let Some((node, pending)) = frames.last_mut() {
                let Some(next) = pending.pop() else {
                    let done = *node;
                    frames.pop();
                    chain.pop();
                    on_stack.remove(done);
                    visited.insert(done);
                    continue;
                };

                if on_stack.contains(next) {
                    let from = chain.iter().position(|p| *p == next).unwrap_or(0);
                    let mut path: Vec<String> =
                        chain[from..].iter().map(|p| p.to_string()).collect();
                    path.push(next.to_string());
                    cycles.push(CircularReference { path });
                } else if !visited.contains(next) {
                    on_stack.insert(next);
                    chain.push(next);
                    frames.push((next, self.pending_targets(next)));
                }
            }
        }

        cycles
    }
}
