use docqa_core::chunker::{split_sentences, Chunker, SentenceBoundary};
use docqa_core::config::ChunkingSettings;
use docqa_core::types::Document;

fn topic_sentences(n: usize) -> String {
    (1..=n).map(|i| format!("Topic{} alpha bravo charlie.", i)).collect::<Vec<_>>().join(" ")
}

/// Concatenate chunk units, dropping each chunk's leading units that repeat
/// the tail of the previous chunk.
fn reassemble(chunks: Vec<Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut prev: Vec<String> = Vec::new();
    for units in chunks {
        let shared = (0..=prev.len().min(units.len()))
            .rev()
            .find(|&n| prev[prev.len() - n..] == units[..n])
            .unwrap_or(0);
        out.extend(units[shared..].iter().cloned());
        prev = units;
    }
    out
}

#[test]
fn prose_chunks_carry_one_sentence_of_overlap() {
    let chunker = Chunker::new(ChunkingSettings { target_tokens: 20, overlap_tokens: 10, max_chars: 1500 });
    let chunks = chunker.chunk_text(&topic_sentences(10), "Doc");

    let bodies: Vec<&str> = chunks.iter().map(|c| c.text.strip_prefix("Doc\n").unwrap()).collect();
    assert_eq!(bodies.len(), 3);
    assert!(bodies[0].starts_with("Topic1 ") && bodies[0].ends_with("Topic4 alpha bravo charlie."));
    assert!(bodies[1].starts_with("Topic4 ") && bodies[1].ends_with("Topic7 alpha bravo charlie."));
    assert!(bodies[2].starts_with("Topic7 ") && bodies[2].ends_with("Topic10 alpha bravo charlie."));

    let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["Doc:0", "Doc:1", "Doc:2"]);
}

#[test]
fn overlap_alone_is_never_emitted() {
    let chunker = Chunker::new(ChunkingSettings { target_tokens: 20, overlap_tokens: 10, max_chars: 1500 });
    assert_eq!(chunker.chunk_text(&topic_sentences(4), "Doc").len(), 1);

    // switching to rows flushes prose once; the carried sentence is not re-emitted
    let rows: Vec<String> = (1..=3).map(|i| format!("alpha{},bravo,charlie", i)).collect();
    let text = format!("{}\n{}", topic_sentences(4), rows.join("\n"));
    let chunks = chunker.chunk_text(&text, "Doc");
    assert_eq!(chunks.len(), 2);
    assert!(!chunks[0].is_tabular());
    assert_eq!(chunks[1].row_range.as_deref(), Some("1-3"));
}

#[test]
fn csv_rows_group_with_five_row_overlap() {
    let rows: Vec<String> = (1..=40).map(|i| format!("item{},{},red", i, i)).collect();
    let chunks = Chunker::default().chunk_text(&rows.join("\n"), "Sheet");

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].section, "rows 1-30");
    assert_eq!(chunks[0].row_range.as_deref(), Some("1-30"));
    assert_eq!(chunks[1].section, "rows 26-40");
    assert_eq!(chunks[1].row_range.as_deref(), Some("26-40"));
    assert!(chunks[0].text.starts_with("Sheet > rows\nitem1 ; 1 ; red\n"));
    assert!(chunks[1].text.starts_with("Sheet > rows\nitem26 ; 26 ; red\n"));
    assert!(chunks.iter().all(|c| c.is_tabular()));
}

#[test]
fn heading_becomes_section_prefix() {
    let text = "# Intro\nThe quick brown fox jumps over the lazy dog.";
    let chunks = Chunker::default().chunk_text(text, "Doc");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].section, "Intro");
    assert_eq!(chunks[0].text, "Doc > Intro\nThe quick brown fox jumps over the lazy dog.");
    assert!(!chunks[0].is_tabular());
}

#[test]
fn numeric_only_text_is_dropped() {
    let chunks = Chunker::default().chunk_text("12 34 56\n78 90 12", "Nums");
    assert!(chunks.is_empty());
}

#[test]
fn chunk_text_is_capped() {
    let long = (0..200).map(|_| "word").collect::<Vec<_>>().join(" ");
    let chunker = Chunker::new(ChunkingSettings { target_tokens: 10_000, overlap_tokens: 0, max_chars: 50 });
    let chunks = chunker.chunk_text(&long, "Doc");
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text.chars().count(), 50);
}

#[test]
fn empty_input_yields_nothing() {
    assert!(Chunker::default().chunk_text("", "Doc").is_empty());
    assert!(Chunker::default().chunk_text(" \n\t\n", "Doc").is_empty());
}

#[test]
fn document_metadata_flows_into_chunks() {
    let doc = Document::new("kb-1", "Handbook", "inline", "Status: active\nThe office opens at nine every weekday morning.");
    let chunks = Chunker::default().chunk_document(&doc);
    assert_eq!(chunks.len(), 1);
    let c = &chunks[0];
    assert_eq!(c.id, "kb-1:0");
    assert_eq!(c.doc_id, "kb-1");
    assert_eq!(c.source, "inline");
    assert_eq!(c.title, "Handbook");
    assert_eq!(c.text, "Handbook\nStatus: active The office opens at nine every weekday morning.");
}

#[test]
fn chunking_is_deterministic() {
    let text = format!("# Guide\n{}\na,b,c\nd,e,f", topic_sentences(12));
    let a = Chunker::default().chunk_text(&text, "Doc");
    let b = Chunker::default().chunk_text(&text, "Doc");
    assert_eq!(a, b);
}

#[test]
fn prose_chunks_reassemble_to_source() {
    let chunker = Chunker::new(ChunkingSettings { target_tokens: 20, overlap_tokens: 10, max_chars: 1500 });
    let source = topic_sentences(15);
    let chunks = chunker.chunk_text(&source, "Doc");
    assert!(chunks.len() > 1);

    let units: Vec<Vec<String>> = chunks
        .iter()
        .map(|c| split_sentences(c.text.strip_prefix("Doc\n").unwrap(), SentenceBoundary::Capitalized))
        .collect();
    // every chunk after the first starts with carried-over text
    assert!(units.windows(2).all(|w| w[0].last() == w[1].first()));
    assert_eq!(reassemble(units), split_sentences(&source, SentenceBoundary::Capitalized));
}

#[test]
fn csv_chunks_reassemble_to_source_rows() {
    let rows: Vec<String> = (1..=40).map(|i| format!("item{},{},red", i, i)).collect();
    let chunks = Chunker::default().chunk_text(&rows.join("\n"), "Sheet");

    let units: Vec<Vec<String>> = chunks
        .iter()
        .map(|c| c.text.strip_prefix("Sheet > rows\n").unwrap().lines().map(str::to_string).collect())
        .collect();
    assert_eq!(units[0][25..], units[1][..5]);
    let expected: Vec<String> = (1..=40).map(|i| format!("item{} ; {} ; red", i, i)).collect();
    assert_eq!(reassemble(units), expected);
}
