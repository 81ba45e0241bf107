/// Embedding capability. Implementations return L2-normalized vectors of
/// length `dim()`. Query/passage prompt formatting is the provider's concern.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>>;
    fn embed_passages(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Reranking capability: one relevance score per passage, higher is better.
pub trait Reranker: Send + Sync {
    fn score(&self, query: &str, passages: &[String]) -> anyhow::Result<Vec<f32>>;
}
