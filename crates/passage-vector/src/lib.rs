//! LanceDB-backed persistent vector index.
//!
//! Stores `(id, text, embedding)` entries and answers nearest-neighbor
//! queries by cosine distance. Identifiers come from a monotonic sequence
//! persisted in a metadata table, so repeated ingestions accumulate without
//! ever reusing an id.

pub mod index;
pub mod schema;
pub mod table;

pub use index::VectorIndex;
