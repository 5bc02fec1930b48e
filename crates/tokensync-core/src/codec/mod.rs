//! Payload codecs for size-limited stores.
//!
//! Only the persistence path uses these; comparison stages never see chunk
//! boundaries.

pub mod chunk;

pub use chunk::{join_chunks, split_chunks, ChunkCodec, DEFAULT_MAX_CHUNK_SIZE};
