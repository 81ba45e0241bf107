use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::{debug, info};

use candle_core::{DType, Device};
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use tokenizers::Tokenizer;

use docqa_core::traits::Reranker;

use crate::device::select_device;
use crate::tokenize::{encode_pairs, load_tokenizer};
use crate::weights::load_var_builder;
use crate::MAX_SEQ_LEN;

const BATCH_SIZE: usize = 16;

/// XLM-RoBERTa cross-encoder with a single relevance logit (e.g. bge-reranker).
pub struct CrossEncoderReranker {
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoderReranker {
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading reranker");
        let tokenizer = load_tokenizer(&model_dir.join("tokenizer.json"), MAX_SEQ_LEN)?;
        let config_path = model_dir.join("config.json");
        let config: XLMRobertaConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Invalid reranker config {}: {}", config_path.display(), e))?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb)?;
        Ok(Self { model, tokenizer, device })
    }
}

impl Reranker for CrossEncoderReranker {
    fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(passages.len());
        for batch in passages.chunks(BATCH_SIZE) {
            let enc = encode_pairs(&self.tokenizer, query, batch, &self.device)?;
            let logits = self.model.forward(&enc.input_ids, &enc.attention_mask, &enc.token_type_ids)?;
            let logits = logits.flatten_all()?.to_dtype(DType::F32)?.to_device(&Device::Cpu)?;
            scores.extend(logits.to_vec1::<f32>()?);
        }
        if scores.len() != passages.len() {
            return Err(anyhow!("reranker returned {} scores for {} passages", scores.len(), passages.len()));
        }
        debug!(passages = passages.len(), "reranked");
        Ok(scores)
    }
}

/// Fraction of lower-cased query words contained in each passage.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapReranker;

impl Reranker for OverlapReranker {
    fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let query_lower = query.to_lowercase();
        let words: Vec<&str> = query_lower.split_whitespace().collect();
        if words.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }
        Ok(passages
            .iter()
            .map(|p| {
                let content = p.to_lowercase();
                let hits = words.iter().filter(|w| content.contains(**w)).count();
                hits as f32 / words.len() as f32
            })
            .collect())
    }
}
