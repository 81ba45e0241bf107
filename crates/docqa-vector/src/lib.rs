//! docqa-vector
//!
//! The persistent store: a lance table of position-ordered vectors, a JSONL
//! metadata sidecar aligned by position, and the derived lexical index.
pub mod schema;
pub mod sidecar;
pub mod store;
pub mod table;

pub use store::{SearchHit, VectorStore};

pub const VECTOR_DB_DIR: &str = "vectors.lance";
pub const VECTOR_TABLE: &str = "vectors";
pub const METADATA_FILE: &str = "metadata.jsonl";
