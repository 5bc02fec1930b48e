#![allow(clippy::unwrap_used, clippy::expect_used)]

//! ChunkCodec round-trip and size-bound properties

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tokensync_core::codec::{join_chunks, ChunkCodec};
use tokensync_core::errors::TokenSyncError;
use tokensync_core::model::Snapshot;

fn payload_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    proptest::collection::btree_map("[a-z.]{1,12}", any::<String>(), 0..16)
}

proptest! {
    #[test]
    fn round_trip_restores_payload(payload in payload_strategy(), size in 1usize..64) {
        let codec = ChunkCodec::new(size).unwrap();
        let chunks = codec.encode(&payload).unwrap();
        let restored: BTreeMap<String, String> = codec.decode(&chunks).unwrap();
        prop_assert_eq!(restored, payload);
    }

    #[test]
    fn chunks_respect_size_bound(payload in payload_strategy(), size in 1usize..64) {
        let codec = ChunkCodec::new(size).unwrap();
        let serialized = serde_json::to_string(&payload).unwrap();
        let chunks = codec.encode(&payload).unwrap();

        let char_count = serialized.chars().count();
        let expected = char_count.div_ceil(size).max(1);
        prop_assert_eq!(chunks.len(), expected);
        for chunk in &chunks {
            prop_assert!(chunk.chars().count() <= size);
        }
        prop_assert_eq!(join_chunks(&chunks), serialized);
    }
}

#[test]
fn test_snapshot_survives_chunking() {
    let raw = json!({
        "syncedAt": "2024-05-01T12:00:00Z",
        "entries": {
            "k1": { "stableId": "V1", "path": "colors.primary", "value": "#fff", "type": "COLOR" },
            "k2": { "stableId": "V2", "path": "space.sm", "value": 4, "type": "FLOAT" }
        }
    });
    let snapshot = Snapshot::from_value(&raw).unwrap().snapshot;

    let codec = ChunkCodec::new(7).unwrap();
    let chunks = codec.encode(&snapshot).unwrap();
    assert!(chunks.len() > 1);

    let restored: Snapshot = codec.decode(&chunks).unwrap();
    assert_eq!(restored, snapshot);
}

#[test]
fn test_truncated_payload_is_corrupt() {
    let codec = ChunkCodec::new(4).unwrap();
    let mut chunks = codec.encode(&json!({ "a": [1, 2, 3] })).unwrap();
    chunks.pop();

    let err = codec.decode::<Value>(&chunks).unwrap_err();
    match err {
        TokenSyncError::CorruptPayload { chunk_count, .. } => {
            assert_eq!(chunk_count, chunks.len());
        }
        other => panic!("expected CorruptPayload, got {other:?}"),
    }
}

#[test]
fn test_default_chunk_size() {
    assert_eq!(ChunkCodec::default().max_chunk_size(), 90_000);
}
