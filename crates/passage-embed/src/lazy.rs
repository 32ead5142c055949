use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use anyhow::anyhow;
use passage_core::error::{Error, Result};
use passage_core::traits::Embedder;

use crate::{default_embedder, default_embedder_id, EMBEDDING_DIM, MODEL_MAX_LEN};

/// Explicit handle around the one-time model load.
///
/// `load` is idempotent and concurrent first calls are serialized, so the
/// model is built at most once. `embed_batch` before `load` fails with
/// [`Error::ModelNotLoaded`] instead of loading implicitly; construct one of
/// these at process start and pass it to the engine.
pub struct LazyEmbedder {
    model_dir: PathBuf,
    id: &'static str,
    slot: OnceLock<Box<dyn Embedder>>,
    init: Mutex<()>,
}

impl LazyEmbedder {
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            id: default_embedder_id(),
            slot: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn load(&self) -> Result<()> {
        if self.slot.get().is_some() {
            return Ok(());
        }
        let _guard = self
            .init
            .lock()
            .map_err(|_| anyhow!("embedder init lock poisoned"))?;
        if self.slot.get().is_none() {
            let built = default_embedder(&self.model_dir).map_err(Error::from)?;
            let _ = self.slot.set(built);
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }
}

impl Embedder for LazyEmbedder {
    fn embedder_id(&self) -> &str {
        self.id
    }

    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    fn max_len(&self) -> usize {
        MODEL_MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inner = self.slot.get().ok_or(Error::ModelNotLoaded)?;
        inner.embed_batch(texts)
    }
}
