use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use docqa_core::config::RetrievalSettings;
use docqa_core::traits::{Embedder, Reranker};
use docqa_core::types::{truncate_chars, ChunkRecord};
use docqa_vector::VectorStore;

use crate::fusion::reciprocal_rank_fusion;
use crate::mmr::mmr_select;

/// One cited passage: the stored record plus its 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub rank: usize,
    pub snippet: String,
    pub position: usize,
    #[serde(default)]
    pub cited: bool,
    #[serde(flatten)]
    pub record: ChunkRecord,
}

/// `contexts[i]` is the full text of `sources[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    pub contexts: Vec<String>,
    pub sources: Vec<SourceRecord>,
}

impl RetrievalResult {
    pub fn is_empty(&self) -> bool { self.contexts.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Candidates,
    Fusion,
    Diversify,
    Rerank,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Candidates => "candidates",
            Stage::Fusion => "fusion",
            Stage::Diversify => "diversify",
            Stage::Rerank => "rerank",
        };
        f.write_str(name)
    }
}

struct StageError {
    stage: Stage,
    source: anyhow::Error,
}

fn at(stage: Stage) -> impl Fn(anyhow::Error) -> StageError {
    move |source| StageError { stage, source }
}

/// Vector + lexical candidates, RRF, MMR, rerank.
///
/// Any stage failure (error or panic) yields an empty result; the failing
/// stage is logged.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, reranker: Arc<dyn Reranker>, settings: RetrievalSettings) -> Self {
        Self { embedder, reranker, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings { &self.settings }

    #[instrument(skip(self, store), fields(size = store.size()))]
    pub fn retrieve(&self, query: &str, top_k: usize, store: &mut VectorStore) -> RetrievalResult {
        if store.is_empty() {
            debug!("empty index");
            return RetrievalResult::default();
        }
        match catch_unwind(AssertUnwindSafe(|| self.run(query, top_k, store))) {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(stage = %e.stage, error = %e.source, "retrieval failed");
                RetrievalResult::default()
            }
            Err(_) => {
                warn!("retrieval panicked");
                RetrievalResult::default()
            }
        }
    }

    fn run(&self, query: &str, top_k: usize, store: &mut VectorStore) -> Result<RetrievalResult, StageError> {
        let s = &self.settings;

        let query_vec = self.embedder.embed_query(query).map_err(at(Stage::Candidates))?;
        let vector_positions: Vec<usize> = store
            .search(&query_vec, s.vector_width)
            .map_err(at(Stage::Candidates))?
            .into_iter()
            .map(|hit| hit.position)
            .collect();
        store.ensure_lexical().map_err(at(Stage::Candidates))?;
        let lexical_positions: Vec<usize> = store
            .lexical_topk(query, s.lexical_width)
            .map_err(at(Stage::Candidates))?
            .into_iter()
            .map(|(_, position)| position)
            .collect();
        debug!(vector = vector_positions.len(), lexical = lexical_positions.len(), "candidates");

        let candidates: Vec<usize> = reciprocal_rank_fusion(&[&vector_positions, &lexical_positions], s.rrf_k)
            .into_iter()
            .map(|(position, _)| position)
            .collect();
        if candidates.is_empty() {
            return Ok(RetrievalResult::default());
        }
        let texts = candidates
            .iter()
            .map(|&p| passage_at(store, p))
            .collect::<anyhow::Result<Vec<String>>>()
            .map_err(at(Stage::Fusion))?;

        let vectors = self.embedder.embed_passages(&texts).map_err(at(Stage::Diversify))?;
        if vectors.len() != texts.len() {
            return Err(at(Stage::Diversify)(anyhow!("{} embeddings for {} passages", vectors.len(), texts.len())));
        }
        let picked = mmr_select(&query_vec, &vectors, s.mmr_top.min(candidates.len()), s.mmr_lambda);
        let passages: Vec<String> = picked.iter().map(|&i| texts[i].clone()).collect();

        let scores = self.reranker.score(query, &passages).map_err(at(Stage::Rerank))?;
        if scores.len() != passages.len() {
            return Err(at(Stage::Rerank)(anyhow!("{} scores for {} passages", scores.len(), passages.len())));
        }
        let mut order: Vec<usize> = (0..picked.len()).collect();
        // stable: equal scores keep the diversified order
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(s.rerank_top.min(top_k));

        let mut result = RetrievalResult::default();
        for (i, &slot) in order.iter().enumerate() {
            let position = candidates[picked[slot]];
            let mut record = store.record(position).cloned().unwrap_or_default();
            for key in ["rank", "snippet", "position", "cited"] {
                record.extra.remove(key);
            }
            let context = passages[slot].clone();
            result.sources.push(SourceRecord {
                rank: i + 1,
                snippet: truncate_chars(&context, s.snippet_chars).to_string(),
                position,
                cited: false,
                record,
            });
            result.contexts.push(context);
        }
        debug!(returned = result.contexts.len(), "retrieved");
        Ok(result)
    }
}

fn passage_at(store: &VectorStore, position: usize) -> anyhow::Result<String> {
    store
        .record(position)
        .map(|r| r.passage().to_string())
        .ok_or_else(|| anyhow!("no metadata at position {}", position))
}
