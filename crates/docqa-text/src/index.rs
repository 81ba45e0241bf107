use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use crate::tantivy_utils::{build_schema, register_tokenizer, POSITION_FIELD, TEXT_FIELD};

const WRITER_HEAP: usize = 50_000_000;

/// Query-side tokenization matching the indexed analyzer.
pub fn tokenize(text: &str) -> Vec<String> {
	text.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// BM25 index whose document `i` is the `i`-th text handed to [`LexicalIndex::build`].
pub struct LexicalIndex {
	reader: IndexReader,
	position_field: Field,
	text_field: Field,
	len: usize,
}

impl LexicalIndex {
	pub fn build<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let position_field = schema.get_field(POSITION_FIELD)?;
		let text_field = schema.get_field(TEXT_FIELD)?;

		// one thread keeps a single segment in insertion order
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP)?;
		for (position, text) in texts.iter().enumerate() {
			writer.add_document(doc!(
				position_field => position as u64,
				text_field => text.as_ref(),
			))?;
		}
		writer.commit()?;

		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		debug!(docs = texts.len(), "built lexical index");
		Ok(Self { reader, position_field, text_field, len: texts.len() })
	}

	pub fn len(&self) -> usize { self.len }

	pub fn is_empty(&self) -> bool { self.len == 0 }

	/// Up to `k` `(score, position)` pairs by descending BM25, ties by
	/// ascending position. Only documents sharing a token with the query appear.
	///
	/// Zero-score documents are not padded in, so with more than `k` stored
	/// chunks fewer lexical positions reach fusion than a score-everything
	/// BM25 would give. A non-matching position adds only arbitrary rank to RRF.
	pub fn top_k(&self, query: &str, k: usize) -> Result<Vec<(f32, usize)>> {
		let tokens = tokenize(query);
		if tokens.is_empty() || k == 0 || self.len == 0 {
			return Ok(vec![]);
		}
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
			.iter()
			.map(|t| {
				let term = Term::from_field_text(self.text_field, t);
				let q: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
				(Occur::Should, q)
			})
			.collect();
		let query = BooleanQuery::new(clauses);

		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let position = doc
				.get_first(self.position_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| anyhow::anyhow!("lexical document without position"))?;
			hits.push((score, position as usize));
		}
		hits.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
		Ok(hits)
	}
}
