//! Retrieval orchestrator: chunk → embed → store on ingestion,
//! embed → search (→ synthesize) on query.
//!
//! The engine owns its collaborators explicitly — an embedder, a vector
//! index, a synthesizer — all constructed once at process start and passed
//! in. Each operation runs to completion or fails whole; a failure at any
//! step aborts the operation with no partial state reported.

use passage_core::error::{Error, Result};
use passage_core::text::{chunk_words, normalize, ChunkingConfig};
use passage_core::traits::Embedder;
use passage_core::types::SearchHit;
use passage_llm::Synthesizer;
use passage_vector::VectorIndex;

/// How a query should be answered. Chosen explicitly by the caller, never
/// inferred from whether a credential happens to be present.
#[derive(Debug, Clone)]
pub enum QueryMode {
    /// Ranked passages only; fully local.
    LocalRetrieval,
    /// Ranked passages plus a grounded answer from the external chat model.
    GroundedSynthesis { model: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub chunks: Vec<SearchHit>,
    pub answer: Option<String>,
}

pub struct RetrievalEngine {
    chunking: ChunkingConfig,
    embedder: Box<dyn Embedder>,
    index: VectorIndex,
    synthesizer: Synthesizer,
}

impl RetrievalEngine {
    pub fn new(
        chunking: ChunkingConfig,
        embedder: Box<dyn Embedder>,
        index: VectorIndex,
        synthesizer: Synthesizer,
    ) -> Self {
        Self { chunking, embedder, index, synthesizer }
    }

    /// Normalize, chunk, embed, and store one document's text. Returns the
    /// number of chunks stored. Text that normalizes or chunks to nothing is
    /// an [`Error::EmptyDocument`].
    pub async fn ingest(&self, raw_text: &str) -> Result<usize> {
        let text = normalize(raw_text);
        if text.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let chunks = chunk_words(&text, &self.chunking)?;
        if chunks.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        self.index.insert(&chunks, &embeddings).await?;
        Ok(chunks.len())
    }

    /// Embed the query and return the `top_k` nearest passages. Fails with
    /// [`Error::EmptyIndex`] when nothing has been ingested.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if self.index.count().await? == 0 {
            return Err(Error::EmptyIndex);
        }
        let query_vec = self.embedder.embed_batch(&[query.to_string()])?.remove(0);
        self.index.search(&query_vec, top_k).await
    }

    /// Retrieve, then optionally synthesize a grounded answer over the
    /// ranked passages.
    pub async fn ask(&self, query: &str, top_k: usize, mode: &QueryMode) -> Result<QueryResponse> {
        let chunks = self.retrieve(query, top_k).await?;
        let answer = match mode {
            QueryMode::LocalRetrieval => None,
            QueryMode::GroundedSynthesis { model, api_key } => {
                let texts: Vec<String> = chunks.iter().map(|h| h.text.clone()).collect();
                Some(self.synthesizer.synthesize(query, &texts, model, api_key).await?)
            }
        };
        Ok(QueryResponse { chunks, answer })
    }

    pub async fn count(&self) -> Result<usize> {
        self.index.count().await
    }

    pub async fn clear(&self) -> Result<()> {
        self.index.clear().await
    }
}
