use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use docqa_core::chunker::Chunker;
use docqa_core::config::{expand_path, Settings};
use docqa_core::traits::{Embedder, Reranker};
use docqa_core::types::{Chunk, ChunkRecord, Document};
use docqa_vector::VectorStore;

use crate::answer::AnswerSynthesizer;
use crate::retriever::{Retriever, SourceRecord};

pub const DEFAULT_INLINE_TITLE: &str = "Inline Document";
pub const DEFAULT_INLINE_ID: &str = "inline";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub ingested_chunks: usize,
    pub index_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Falls back to `retrieval.default_top_k`.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool { true }

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), top_k: None, strict: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub cited: Vec<usize>,
    pub sources: Vec<SourceRecord>,
    pub strict: bool,
}

/// Chunker, store, retriever and synthesizer behind the ingest and query calls.
pub struct HybridEngine {
    chunker: Chunker,
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    default_top_k: usize,
}

impl HybridEngine {
    /// Open the store under `storage.index_dir` sized to the embedder.
    pub fn open(settings: &Settings, embedder: Arc<dyn Embedder>, reranker: Arc<dyn Reranker>) -> Result<Self> {
        let index_dir = expand_path(&settings.storage.index_dir);
        let store = VectorStore::open(&index_dir, embedder.dim(), settings.storage.text_cap)?;
        Ok(Self::with_store(settings, store, embedder, reranker))
    }

    pub fn with_store(settings: &Settings, store: VectorStore, embedder: Arc<dyn Embedder>, reranker: Arc<dyn Reranker>) -> Self {
        Self {
            chunker: Chunker::new(settings.chunking.clone()),
            store,
            retriever: Retriever::new(embedder.clone(), reranker, settings.retrieval.clone()),
            embedder,
            synthesizer: AnswerSynthesizer::new(settings.answer.clone()),
            default_top_k: settings.retrieval.default_top_k,
        }
    }

    pub fn store(&self) -> &VectorStore { &self.store }

    pub fn index_size(&self) -> usize { self.store.size() }

    /// Chunk inline texts under one doc id, embed and append them.
    #[instrument(skip_all, fields(texts = req.texts.len()))]
    pub fn ingest_texts(&mut self, req: IngestRequest) -> Result<IngestReport> {
        let doc_id = req.doc_id.filter(|s| !s.is_empty());
        let title = req
            .title
            .filter(|s| !s.is_empty())
            .or_else(|| doc_id.clone())
            .unwrap_or_else(|| DEFAULT_INLINE_TITLE.to_string());
        let doc_id = doc_id.unwrap_or_else(|| DEFAULT_INLINE_ID.to_string());
        let source = req.source.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_INLINE_ID.to_string());
        let docs: Vec<Document> = req
            .texts
            .into_iter()
            .map(|text| Document::new(doc_id.clone(), title.clone(), source.clone(), text))
            .collect();
        self.ingest_documents(&docs)
    }

    /// Chunk, embed and append already-loaded documents.
    #[instrument(skip_all, fields(docs = docs.len()))]
    pub fn ingest_documents(&mut self, docs: &[Document]) -> Result<IngestReport> {
        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunker.chunk_document(d)).collect();
        if chunks.is_empty() {
            return Ok(IngestReport { ingested_chunks: 0, index_size: self.store.size() });
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_passages(&texts)?;
        if vectors.len() != texts.len() {
            return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), texts.len()));
        }
        let records: Vec<ChunkRecord> = chunks.into_iter().map(ChunkRecord::from).collect();
        let ingested = records.len();
        self.store.add(vectors, records)?;
        info!(ingested, index_size = self.store.size(), "ingested");
        Ok(IngestReport { ingested_chunks: ingested, index_size: self.store.size() })
    }

    /// Retrieve, synthesize, and flag the sources the answer cites.
    #[instrument(skip_all, fields(strict = req.strict))]
    pub fn query(&mut self, req: QueryRequest) -> QueryResponse {
        let top_k = req.top_k.unwrap_or(self.default_top_k);
        let retrieved = self.retriever.retrieve(&req.query, top_k, &mut self.store);
        let answer = self.synthesizer.synthesize(&req.query, &retrieved.contexts, req.strict);
        let sources = retrieved
            .sources
            .into_iter()
            .map(|mut s| {
                s.cited = answer.cited.contains(&s.rank);
                s
            })
            .collect();
        QueryResponse { answer: answer.text, cited: answer.cited, sources, strict: req.strict }
    }
}
