//! Domain types shared by the retrieval pipeline.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A bounded, overlapping window of source text — the unit of retrieval.
///
/// - `text`: the window's words joined by single spaces
/// - `source_offset`: index of the window's first word in the normalized
///   document
///
/// Chunks are immutable once created and live only for the duration of one
/// ingestion. Stored identifiers are assigned by the vector index at insert
/// time, from a sequence persisted alongside the index, so repeated
/// ingestions accumulate instead of colliding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_offset: usize,
}

/// One ranked entry of a query result.
///
/// `distance` is cosine distance (`1 - cosine_similarity`); lower means more
/// similar. Results are ordered ascending by distance, ties broken by
/// insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub text: String,
    pub distance: f32,
}
