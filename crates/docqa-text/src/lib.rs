//! docqa-text
//!
//! In-memory tantivy BM25 index over the stored chunk texts. The index is
//! derived data: it is rebuilt from the store's records, never persisted.
pub mod tantivy_utils;
pub mod index;

pub use index::{tokenize, LexicalIndex};
