//! Split a serialized payload into bounded segments and reassemble it.
//!
//! Chunk size is counted in characters (Unicode scalar values), so a split
//! never lands inside a multi-byte sequence and the chunk count is exactly
//! `ceil(chars / max_chunk_size)`, minimum one.

use crate::errors::{Result, TokenSyncError};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default segment size, below the 100 kB per-key limit of plugin storage.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 90_000;

/// Chunking codec bound to one maximum segment size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCodec {
    max_chunk_size: usize,
}

impl ChunkCodec {
    /// # Errors
    ///
    /// `InvalidChunkSize` when `max_chunk_size` is zero.
    pub fn new(max_chunk_size: usize) -> Result<Self> {
        if max_chunk_size == 0 {
            return Err(TokenSyncError::InvalidChunkSize { size: 0 });
        }
        Ok(Self { max_chunk_size })
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Serialize `payload` as JSON and split it into segments.
    ///
    /// # Errors
    ///
    /// `Serialization` if the payload cannot be encoded.
    pub fn encode<T: Serialize + ?Sized>(&self, payload: &T) -> Result<Vec<String>> {
        log_op_start!("chunk_encode", max_chunk_size = self.max_chunk_size as u64);
        let start = std::time::Instant::now();

        let result = serde_json::to_string(payload)
            .map_err(TokenSyncError::from)
            .and_then(|serialized| split_chunks(&serialized, self.max_chunk_size));

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(chunks) => {
                log_op_end!(
                    "chunk_encode",
                    duration_ms = elapsed,
                    chunk_count = chunks.len() as u64
                );
            }
            Err(e) => log_op_error!("chunk_encode", e.clone(), duration_ms = elapsed),
        }
        result
    }

    /// Concatenate segments in order and deserialize.
    ///
    /// # Errors
    ///
    /// `CorruptPayload` if the concatenation does not parse as `T`
    /// (including an empty chunk list).
    pub fn decode<T: DeserializeOwned>(&self, chunks: &[String]) -> Result<T> {
        log_op_start!("chunk_decode", chunk_count = chunks.len() as u64);
        let start = std::time::Instant::now();

        let joined = join_chunks(chunks);
        let result =
            serde_json::from_str::<T>(&joined).map_err(|e| TokenSyncError::CorruptPayload {
                chunk_count: chunks.len(),
                reason: e.to_string(),
            });

        let elapsed = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!("chunk_decode", duration_ms = elapsed);
            }
            Err(e) => log_op_error!("chunk_decode", e.clone(), duration_ms = elapsed),
        }
        result
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Split a string into contiguous segments of at most `max_chunk_size` chars.
///
/// An empty input yields a single empty segment.
///
/// # Errors
///
/// `InvalidChunkSize` when `max_chunk_size` is zero.
pub fn split_chunks(serialized: &str, max_chunk_size: usize) -> Result<Vec<String>> {
    if max_chunk_size == 0 {
        return Err(TokenSyncError::InvalidChunkSize { size: 0 });
    }

    let mut chunks = Vec::with_capacity(serialized.len() / max_chunk_size + 1);
    let mut segment_start = 0;
    let mut segment_chars = 0;
    for (idx, _) in serialized.char_indices() {
        if segment_chars == max_chunk_size {
            chunks.push(serialized[segment_start..idx].to_string());
            segment_start = idx;
            segment_chars = 0;
        }
        segment_chars += 1;
    }
    chunks.push(serialized[segment_start..].to_string());
    Ok(chunks)
}

/// Concatenate segments in order.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(AsRef::as_ref).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkCodec::new(0),
            Err(TokenSyncError::InvalidChunkSize { size: 0 })
        ));
        assert!(split_chunks("abc", 0).is_err());
    }

    #[test]
    fn test_empty_input_yields_one_chunk() {
        assert_eq!(split_chunks("", 4).unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_empty_chunk() {
        assert_eq!(split_chunks("abcdef", 3).unwrap(), vec!["abc", "def"]);
        assert_eq!(split_chunks("abcdefg", 3).unwrap(), vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_split_respects_multibyte_chars() {
        let chunks = split_chunks("héllo→wörld", 2).unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 2));
        assert_eq!(join_chunks(&chunks), "héllo→wörld");
        assert_eq!(chunks.len(), 6);
    }

    #[test]
    fn test_empty_object_round_trip() {
        let codec = ChunkCodec::new(1).unwrap();
        let chunks = codec.encode(&json!({})).unwrap();
        assert_eq!(chunks, vec!["{", "}"]);
        let back: Value = codec.decode(&chunks).unwrap();
        assert_eq!(back, json!({}));
    }

    #[test]
    fn test_decode_corrupt_payload() {
        let codec = ChunkCodec::default();
        let chunks = vec!["{\"a\":".to_string(), "[1,2".to_string()];
        let err = codec.decode::<Value>(&chunks).unwrap_err();
        assert!(matches!(
            err,
            TokenSyncError::CorruptPayload { chunk_count: 2, .. }
        ));
    }

    #[test]
    fn test_decode_empty_chunk_list_is_corrupt() {
        let codec = ChunkCodec::default();
        assert!(matches!(
            codec.decode::<Value>(&[]),
            Err(TokenSyncError::CorruptPayload { .. })
        ));
    }
}
