//! docqa-embed
//!
//! Embedding and reranking providers behind the `docqa_core::traits`
//! capabilities: candle XLM-RoBERTa models loaded from a local directory, and
//! deterministic fallbacks for tests and model-less setups.
pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod prompt;
pub mod rerank;
pub mod tokenize;
mod weights;

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use docqa_core::config::{expand_path, ModelSettings};
use docqa_core::traits::{Embedder, Reranker};

pub use hash::HashEmbedder;
pub use model::EmbeddingModel;
pub use pool::masked_mean_l2;
pub use prompt::PromptFormat;
pub use rerank::{CrossEncoderReranker, OverlapReranker};

/// Maximum sequence length fed to either model.
pub const MAX_SEQ_LEN: usize = 256;

/// `models.use_fake`, or `APP_USE_FAKE_EMBEDDINGS` set to `1`/`true`.
pub fn use_fake(settings: &ModelSettings) -> bool {
    settings.use_fake
        || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn get_default_embedder(settings: &ModelSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake(settings) {
        info!(dim = settings.fake_dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.fake_dim)));
    }
    let dir = resolve_model_dir(settings.embedding_dir.as_deref(), "APP_MODEL_DIR", "models/bge-m3")?;
    Ok(Arc::new(EmbeddingModel::load(&dir)?))
}

pub fn get_default_reranker(settings: &ModelSettings) -> Result<Arc<dyn Reranker>> {
    if use_fake(settings) {
        info!("using overlap reranker");
        return Ok(Arc::new(OverlapReranker));
    }
    let dir = resolve_model_dir(settings.reranker_dir.as_deref(), "APP_RERANKER_DIR", "models/bge-reranker-base")?;
    Ok(Arc::new(CrossEncoderReranker::load(&dir)?))
}

fn resolve_model_dir(configured: Option<&str>, env_key: &str, fallback: &str) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() { return Ok(p); }
        return Err(anyhow!("Configured model directory does not exist: {}", p.display()));
    }
    if let Ok(dir) = std::env::var(env_key) {
        let p = expand_path(&dir);
        if p.exists() { info!(dir = %p.display(), "using {}", env_key); return Ok(p); }
    }
    let p = PathBuf::from(fallback);
    if p.exists() { return Ok(p); }
    Err(anyhow!("Could not locate model directory (set models.* in config, {} or place it at {})", env_key, fallback))
}
