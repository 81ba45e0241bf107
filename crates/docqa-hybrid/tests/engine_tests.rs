use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use docqa_core::config::Settings;
use docqa_core::loader::DocumentLoader;
use docqa_core::traits::{Embedder, Reranker};
use docqa_embed::{HashEmbedder, OverlapReranker};
use docqa_hybrid::{HybridEngine, IngestRequest, QueryRequest, Retriever, REFUSAL};
use docqa_vector::VectorStore;

fn settings_in(dir: &TempDir) -> Settings {
    let mut settings = Settings::default();
    settings.storage.index_dir = dir.path().join("index").to_string_lossy().to_string();
    settings
}

fn engine(dir: &TempDir) -> HybridEngine {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(64));
    let reranker: Arc<dyn Reranker> = Arc::new(OverlapReranker);
    HybridEngine::open(&settings_in(dir), embedder, reranker).expect("open engine")
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const PARIS: &str = "Paris is the capital of France. It is in Europe.";
const BANANAS: &str = "Bananas are yellow fruit grown in tropical climates around the world.";

#[test]
fn empty_index_returns_nothing() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    let resp = engine.query(QueryRequest::new("What is the capital of France?"));
    assert_eq!(resp.answer, REFUSAL);
    assert!(resp.sources.is_empty());
    assert!(resp.cited.is_empty());
    assert!(resp.strict);
}

#[test]
fn ingest_then_answer_with_citations() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    let report = engine
        .ingest_texts(IngestRequest { texts: texts(&[PARIS, BANANAS]), title: Some("Geo".into()), ..IngestRequest::default() })
        .expect("ingest");
    assert_eq!(report.ingested_chunks, 2);
    assert_eq!(report.index_size, 2);

    let resp = engine.query(QueryRequest::new("What is the capital of France?"));
    assert_eq!(resp.sources.len(), 2);
    assert_eq!(resp.sources[0].rank, 1);
    assert!(resp.sources[0].record.text.contains("Paris"));
    assert!(resp.answer.starts_with("Geo Paris is the capital of France."));
    assert!(resp.cited.contains(&1));
    assert!(resp.sources[0].cited);
    assert_eq!(resp.sources[0].snippet, resp.sources[0].record.text);
}

#[test]
fn unrelated_query_is_refused_in_strict_mode() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS]), ..IngestRequest::default() }).unwrap();

    let resp = engine.query(QueryRequest::new("zebra unicorn"));
    assert_eq!(resp.answer, REFUSAL);
    assert!(resp.sources.iter().all(|s| !s.cited));

    let relaxed = engine.query(QueryRequest { query: "hello".into(), top_k: None, strict: false });
    assert!(relaxed.answer.starts_with("Hey!"));
    assert!(!relaxed.strict);
}

#[test]
fn top_k_caps_sources() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    let docs: Vec<String> = (0..6).map(|i| format!("Report number {} covers the harbor budget and the river bridge.", i)).collect();
    engine.ingest_texts(IngestRequest { texts: docs, ..IngestRequest::default() }).unwrap();

    let one = engine.query(QueryRequest { query: "harbor budget".into(), top_k: Some(1), strict: true });
    assert_eq!(one.sources.len(), 1);
    let default = engine.query(QueryRequest::new("harbor budget"));
    assert_eq!(default.sources.len(), 3, "rerank keeps three");
    let ranks: Vec<usize> = default.sources.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn inline_defaults_fill_metadata() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS]), ..IngestRequest::default() }).unwrap();
    engine
        .ingest_texts(IngestRequest { texts: texts(&[BANANAS]), doc_id: Some("fruit".into()), source: Some("wiki".into()), title: None })
        .unwrap();

    let records = engine.store().records();
    assert_eq!((records[0].doc_id.as_str(), records[0].source.as_str(), records[0].title.as_str()), ("inline", "inline", "Inline Document"));
    assert_eq!((records[1].doc_id.as_str(), records[1].source.as_str(), records[1].title.as_str()), ("fruit", "wiki", "fruit"));
    assert!(records.iter().all(|r| r.has_chunk_id()));
}

#[test]
fn chunk_ids_are_unique_across_texts_and_ingests() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS, BANANAS]), ..IngestRequest::default() }).unwrap();
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS]), ..IngestRequest::default() }).unwrap();

    let ids: Vec<&str> = engine.store().records().iter().filter_map(|r| r.chunk_id.as_deref()).collect();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[0], ids[2]);
    assert_ne!(ids[1], ids[2]);
}

#[test]
fn empty_ingest_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    let report = engine.ingest_texts(IngestRequest { texts: texts(&["", "12 34"]), ..IngestRequest::default() }).unwrap();
    assert_eq!(report.ingested_chunks, 0);
    assert_eq!(report.index_size, 0);
}

#[test]
fn loaded_files_persist_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("notes.txt"), "The lighthouse keeper logs every passing ship at night.").unwrap();
    {
        let mut engine = engine(&tmp);
        let docs = DocumentLoader::new().load_path(&data).unwrap();
        let report = engine.ingest_documents(&docs).unwrap();
        assert_eq!(report.ingested_chunks, 1);
    }
    let mut engine = engine(&tmp);
    assert_eq!(engine.index_size(), 1);
    let record = &engine.store().records()[0];
    assert_eq!((record.doc_id.as_str(), record.source.as_str()), ("notes.txt", "file"));

    let resp = engine.query(QueryRequest::new("who logs passing ships"));
    assert_eq!(resp.sources.len(), 1);
    assert_eq!(resp.sources[0].position, 0);
}

#[test]
fn source_records_serialize_flat() {
    let tmp = TempDir::new().unwrap();
    let mut engine = engine(&tmp);
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS]), ..IngestRequest::default() }).unwrap();
    let resp = engine.query(QueryRequest::new("capital of France"));
    let json = serde_json::to_value(&resp).unwrap();
    let source = &json["sources"][0];
    assert_eq!(source["rank"], 1);
    assert_eq!(source["doc_id"], "inline");
    assert!(source["snippet"].is_string());
    assert!(source.get("record").is_none());
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { 64 }
    fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> { Err(anyhow::anyhow!("model offline")) }
    fn embed_passages(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { HashEmbedder::new(64).embed_passages(texts) }
}

struct PanickingReranker;

impl Reranker for PanickingReranker {
    fn score(&self, _query: &str, _passages: &[String]) -> anyhow::Result<Vec<f32>> { panic!("reranker crashed") }
}

struct ShortReranker;

impl Reranker for ShortReranker {
    fn score(&self, _query: &str, _passages: &[String]) -> anyhow::Result<Vec<f32>> { Ok(vec![1.0]) }
}

fn populated_store(tmp: &TempDir) -> VectorStore {
    let settings = settings_in(tmp);
    let mut engine = HybridEngine::open(&settings, Arc::new(HashEmbedder::new(64)), Arc::new(OverlapReranker)).unwrap();
    engine.ingest_texts(IngestRequest { texts: texts(&[PARIS, BANANAS]), ..IngestRequest::default() }).unwrap();
    drop(engine);
    VectorStore::open(&settings.storage.index_dir, 64, 1500).unwrap()
}

#[test]
fn stage_failures_yield_empty_results() {
    let tmp = TempDir::new().unwrap();
    let mut store = populated_store(&tmp);
    let settings = Settings::default().retrieval;

    let failing = Retriever::new(Arc::new(FailingEmbedder), Arc::new(OverlapReranker), settings.clone());
    assert!(failing.retrieve("capital of France", 5, &mut store).is_empty());

    let panicking = Retriever::new(Arc::new(HashEmbedder::new(64)), Arc::new(PanickingReranker), settings.clone());
    assert!(panicking.retrieve("capital of France", 5, &mut store).is_empty());

    let short = Retriever::new(Arc::new(HashEmbedder::new(64)), Arc::new(ShortReranker), settings.clone());
    assert!(short.retrieve("capital of France", 5, &mut store).is_empty());

    let healthy = Retriever::new(Arc::new(HashEmbedder::new(64)), Arc::new(OverlapReranker), settings);
    let result = healthy.retrieve("capital of France", 5, &mut store);
    assert_eq!(result.contexts.len(), 2);
    assert_eq!(result.sources.len(), 2);
}
