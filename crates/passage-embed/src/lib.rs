//! Embedding providers for the retrieval pipeline.
//!
//! The real backend runs BGE-small-en-v1.5 (BERT backbone, 384-dim) with
//! candle from a local model directory. `APP_USE_FAKE_EMBEDDINGS=1` switches
//! to a deterministic hash-based embedder for tests and offline development.

use std::hash::Hasher;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use twox_hash::XxHash64;

use passage_core::error::{Error, Result as CoreResult};
use passage_core::traits::Embedder;

mod device;
mod lazy;
mod pool;
mod tokenize;

pub use device::select_device;
pub use lazy::LazyEmbedder;
pub use pool::mean_pool_l2;

/// Dimensionality shared by the real and the fake provider.
pub const EMBEDDING_DIM: usize = 384;

const MODEL_MAX_LEN: usize = 512;
const MODEL_EMBEDDER_ID: &str = "local:bge-small-en-v1.5:d384";
const FAKE_EMBEDDER_ID: &str = "fake:xxhash:d384";

/// BGE-small-en-v1.5 loaded from `model_dir` (`tokenizer.json`,
/// `config.json`, `pytorch_model.bin`).
pub struct EmbeddingModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
}

impl EmbeddingModel {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        println!("🔄 Loading BGE-small model from {}", model_dir.display());

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let dim = config.hidden_size;

        let weights_path = model_dir.join("pytorch_model.bin");
        let weights = candle_core::pickle::read_all(&weights_path)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        // Checkpoints exist both with and without the "bert." tensor prefix
        let model = BertModel::load(vb.clone(), &config).or_else(|_| BertModel::load(vb.pp("bert"), &config))?;

        println!("✅ Embedding model loaded ({}-dim)", dim);
        Ok(Self { model, tokenizer, device, dim })
    }

    fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let pad_id = 0u32; // BERT [PAD]
        let (input_ids, attention_mask) =
            tokenize::tokenize_on_device(&self.tokenizer, text, MODEL_MAX_LEN, pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool_l2(&hidden, &attention_mask)?;
        let out: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if out.len() != self.dim {
            return Err(anyhow!("pooled embedding has {} dims, expected {}", out.len(), self.dim));
        }
        Ok(out)
    }
}

impl Embedder for EmbeddingModel {
    fn embedder_id(&self) -> &str {
        MODEL_EMBEDDER_ID
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MODEL_MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
        // One forward pass per text; order is preserved by construction.
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_text(text).map_err(Error::from)?);
        }
        Ok(out)
    }
}

/// Deterministic bag-of-words embedder: each token scatters a hash-derived
/// weight into a hash-derived bucket, then the vector is L2-normalized.
/// Identical texts always produce identical vectors.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let mut bucket_hasher = XxHash64::with_seed(0);
            bucket_hasher.write(token.as_bytes());
            let h = bucket_hasher.finish();
            let bucket = (h as usize) % self.dim;
            // signed weight from the high bits
            let weight = ((h >> 32) as u32 as f32) / (u32::MAX as f32) - 0.5;
            v[bucket] += weight;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str {
        FAKE_EMBEDDER_ID
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        MODEL_MAX_LEN
    }

    fn embed_batch(&self, texts: &[String]) -> CoreResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured embedder: the fake one when
/// `APP_USE_FAKE_EMBEDDINGS` is set, otherwise the candle model from
/// `model_dir`.
pub fn default_embedder(model_dir: &Path) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        println!("🧪 Using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(EMBEDDING_DIM)));
    }
    Ok(Box::new(EmbeddingModel::load(model_dir)?))
}

/// The embedder id `default_embedder` will produce for the current
/// environment, known before any model weights are touched. The vector index
/// pins this id, so it must be stable across lazy loads.
pub fn default_embedder_id() -> &'static str {
    if use_fake_embeddings() {
        FAKE_EMBEDDER_ID
    } else {
        MODEL_EMBEDDER_ID
    }
}

/// Locate the model directory: explicit setting first, then the conventional
/// checkout location.
pub fn resolve_model_dir(configured: Option<&str>) -> PathBuf {
    if let Some(dir) = configured {
        return passage_core::config::expand_path(dir);
    }
    PathBuf::from("models/bge-small-en-v1.5")
}
