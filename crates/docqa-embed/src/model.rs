use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use docqa_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::prompt::PromptFormat;
use crate::tokenize::{encode_texts, load_tokenizer};
use crate::weights::load_var_builder;
use crate::MAX_SEQ_LEN;

const BATCH_SIZE: usize = 16;

/// XLM-RoBERTa sentence embedder (e.g. BGE-M3): masked mean pooling, L2 norm.
pub struct EmbeddingModel {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    format: PromptFormat,
    dim: usize,
}

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and weights from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), MAX_SEQ_LEN)?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Invalid model config {}: {}", config_path.display(), e))?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb)?;
        let format = PromptFormat::detect(&model_dir.to_string_lossy());
        info!(dim = config.hidden_size, ?format, "embedding model loaded");
        Ok(Self { model, tokenizer, device, format, dim: config.hidden_size })
    }

    pub fn format(&self) -> PromptFormat { self.format }

    fn embed_formatted(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            let enc = encode_texts(&self.tokenizer, batch, &self.device)?;
            let hidden = self.model.forward(&enc.input_ids, &enc.attention_mask, &enc.token_type_ids, None, None, None)?;
            let pooled = masked_mean_l2(&hidden, &enc.attention_mask)?;
            out.extend(pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?);
        }
        let elapsed = start.elapsed().as_millis();
        if elapsed > 1000 { warn!(texts = texts.len(), elapsed_ms = elapsed as u64, "slow embedding"); }
        debug!(texts = texts.len(), elapsed_ms = elapsed as u64, "embedded");
        Ok(out)
    }
}

impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.dim }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_formatted(&[self.format.query(text)])?
            .pop()
            .ok_or_else(|| anyhow!("model returned no embedding"))
    }

    fn embed_passages(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(vec![]); }
        let formatted: Vec<String> = texts.iter().map(|t| self.format.passage(t)).collect();
        self.embed_formatted(&formatted)
    }
}
