use crate::errors::{Result, TokenSyncError};
use crate::model::entry::Entry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// Snapshot-level metadata. Never part of the comparison identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The registry at one point in time: opaque key → [`Entry`].
///
/// Immutable once produced; the engine only ever borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub metadata: SnapshotMetadata,
    #[serde(alias = "variables")]
    pub entries: BTreeMap<String, Entry>,
}

/// An entry dropped during boundary parsing, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub key: String,
    pub reason: String,
}

/// Result of lenient parsing: the strict snapshot plus what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSnapshot {
    pub snapshot: Snapshot,
    pub skipped: Vec<SkippedEntry>,
}

impl Snapshot {
    pub fn new(metadata: SnapshotMetadata) -> Self {
        Self {
            metadata,
            entries: BTreeMap::new(),
        }
    }

    /// Build a snapshot from `(key, entry)` pairs with empty metadata.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Entry)>,
    {
        Self {
            metadata: SnapshotMetadata::default(),
            entries: entries.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) -> Option<Entry> {
        self.entries.insert(key.into(), entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter()
    }

    /// Parse raw JSON bytes through the lenient boundary.
    ///
    /// # Errors
    ///
    /// - `Serialization`: bytes are not JSON
    /// - `InvalidSnapshotFormat`: see [`Snapshot::from_value`]
    pub fn from_json_bytes(bytes: &[u8]) -> Result<ParsedSnapshot> {
        let raw: Value = serde_json::from_slice(bytes)?;
        Self::from_value(&raw)
    }

    /// Check the document shape once and produce strict types.
    ///
    /// The root must be an object carrying an `entries` (or `variables`)
    /// object. Individual entries that are null, not objects, fail to
    /// deserialize, have an empty `path`, or repeat an existing
    /// `(path, collection, mode)` triple are skipped and reported.
    ///
    /// # Errors
    ///
    /// `InvalidSnapshotFormat` when the root or the entry map is missing or
    /// not an object.
    pub fn from_value(raw: &Value) -> Result<ParsedSnapshot> {
        let obj = raw
            .as_object()
            .ok_or_else(|| TokenSyncError::InvalidSnapshotFormat {
                reason: format!("snapshot root must be an object, got {}", json_kind(raw)),
            })?;

        let entries_raw = obj
            .get("entries")
            .or_else(|| obj.get("variables"))
            .ok_or_else(|| TokenSyncError::InvalidSnapshotFormat {
                reason: "snapshot has no `entries` map".to_string(),
            })?;
        let entries_obj =
            entries_raw
                .as_object()
                .ok_or_else(|| TokenSyncError::InvalidSnapshotFormat {
                    reason: format!(
                        "`entries` must be an object, got {}",
                        json_kind(entries_raw)
                    ),
                })?;

        let metadata = parse_metadata(obj);

        let mut snapshot = Snapshot::new(metadata);
        let mut skipped = Vec::new();
        let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();

        for (key, value) in entries_obj {
            let entry = match parse_entry(value) {
                Ok(entry) => entry,
                Err(reason) => {
                    tracing::warn!(entry_key = %key, reason = %reason, "skipping malformed entry");
                    skipped.push(SkippedEntry {
                        key: key.clone(),
                        reason,
                    });
                    continue;
                }
            };

            let triple = (
                entry.path.clone(),
                entry.collection_name.clone(),
                entry.mode_name.clone(),
            );
            if !seen.insert(triple) {
                let reason = format!(
                    "duplicate entry for `{}` in collection `{}` mode `{}`",
                    entry.path, entry.collection_name, entry.mode_name
                );
                tracing::warn!(entry_key = %key, reason = %reason, "skipping duplicate entry");
                skipped.push(SkippedEntry {
                    key: key.clone(),
                    reason,
                });
                continue;
            }

            snapshot.entries.insert(key.clone(), entry);
        }

        Ok(ParsedSnapshot { snapshot, skipped })
    }

    /// SHA-256 over the canonical JSON of the entry map (metadata excluded).
    ///
    /// # Errors
    ///
    /// `Serialization` if the entry map cannot be encoded.
    pub fn digest(&self) -> Result<String> {
        let canonical = serde_json::to_string(&self.entries)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

fn parse_entry(value: &Value) -> std::result::Result<Entry, String> {
    match value {
        Value::Null => Err("entry is null".to_string()),
        Value::Object(map) => {
            if !map.contains_key("path") {
                return Err("entry has no `path`".to_string());
            }
            let entry: Entry =
                serde_json::from_value(value.clone()).map_err(|e| format!("malformed entry: {e}"))?;
            if entry.path.is_empty() {
                return Err("entry has an empty `path`".to_string());
            }
            Ok(entry)
        }
        other => Err(format!("entry is not an object, got {}", json_kind(other))),
    }
}

fn parse_metadata(obj: &serde_json::Map<String, Value>) -> SnapshotMetadata {
    let synced_at = obj
        .get("syncedAt")
        .and_then(Value::as_str)
        .and_then(|s| match DateTime::parse_from_rfc3339(s) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(synced_at = %s, error = %e, "ignoring unparseable syncedAt");
                None
            }
        });
    let source = obj
        .get("source")
        .and_then(Value::as_str)
        .map(str::to_string);
    SnapshotMetadata { synced_at, source }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExError;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_object_root() {
        let err = Snapshot::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(ExError::from(err).code(), "ERR_INVALID_SNAPSHOT_FORMAT");
    }

    #[test]
    fn test_from_value_requires_entry_map() {
        let err = Snapshot::from_value(&json!({"syncedAt": "2026-01-01T00:00:00Z"})).unwrap_err();
        assert!(matches!(err, TokenSyncError::InvalidSnapshotFormat { .. }));
    }

    #[test]
    fn test_from_value_accepts_variables_alias() {
        let parsed = Snapshot::from_value(&json!({
            "variables": {"k1": {"path": "a", "value": 1}}
        }))
        .unwrap();
        assert_eq!(parsed.snapshot.len(), 1);
    }

    #[test]
    fn test_from_value_skips_malformed_entries() {
        let parsed = Snapshot::from_value(&json!({
            "syncedAt": "2026-03-01T10:00:00Z",
            "source": "figma",
            "entries": {
                "ok": {"path": "colors.primary", "value": "#fff"},
                "null": null,
                "scalar": 42,
                "nopath": {"value": "#000"},
                "empty": {"path": "", "value": "#000"}
            }
        }))
        .unwrap();

        assert_eq!(parsed.snapshot.len(), 1);
        assert_eq!(parsed.skipped.len(), 4);
        assert_eq!(parsed.snapshot.metadata.source.as_deref(), Some("figma"));
        assert!(parsed.snapshot.metadata.synced_at.is_some());
    }

    #[test]
    fn test_from_value_skips_duplicate_triple() {
        let parsed = Snapshot::from_value(&json!({
            "entries": {
                "a": {"path": "x", "collection": "c", "mode": "m", "value": 1},
                "b": {"path": "x", "collection": "c", "mode": "m", "value": 2},
                "c": {"path": "x", "collection": "c", "mode": "n", "value": 3}
            }
        }))
        .unwrap();
        assert_eq!(parsed.snapshot.len(), 2);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].key, "b");
    }

    #[test]
    fn test_digest_ignores_metadata() {
        let mut a = Snapshot::from_entries([("k", Entry::new("a.b", "1"))]);
        let b = a.clone();
        a.metadata.source = Some("other".to_string());
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap().len(), 64);
    }

    #[test]
    fn test_digest_changes_with_value() {
        let a = Snapshot::from_entries([("k", Entry::new("a.b", "1"))]);
        let b = Snapshot::from_entries([("k", Entry::new("a.b", "2"))]);
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }
}
