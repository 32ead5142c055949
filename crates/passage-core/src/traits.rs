use std::path::Path;

use crate::error::Result;

/// Maps text to fixed-dimension vectors.
///
/// `embed_batch` returns one vector per input, in input order, and is
/// deterministic for a fixed model and input. `embedder_id` is a stable
/// identifier for the provider/model pair (e.g. `local:bge-small-en-v1.5:d384`);
/// the vector index pins it so vectors from different providers never mix in
/// one store.
pub trait Embedder: Send + Sync {
    fn embedder_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// External collaborator that turns a document handle into raw text.
///
/// Extraction failure is reported to the caller, which treats it (and empty
/// output) as an empty document rather than crashing.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, source: &Path) -> anyhow::Result<String>;
}
