//! docqa-hybrid
//!
//! Multi-stage retrieval (vector + lexical candidates, reciprocal rank
//! fusion, MMR diversification, reranking), extractive answer synthesis and
//! the [`HybridEngine`] facade that ingests documents and answers queries.
pub mod answer;
pub mod engine;
pub mod fusion;
pub mod mmr;
pub mod retriever;
mod smalltalk;

pub use answer::{Answer, AnswerSynthesizer, REFUSAL};
pub use engine::{HybridEngine, IngestReport, IngestRequest, QueryRequest, QueryResponse};
pub use retriever::{RetrievalResult, Retriever, SourceRecord};
