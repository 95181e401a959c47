// file: src/index/mod.rs
// description: vector index module exports and public api
// reference: chunking, embedding, persistence and querying

pub mod chunker;
pub mod progress;
pub mod query_engine;
pub mod vector_index;

pub use chunker::{SentenceSplitter, estimate_tokens};
pub use progress::{BuildStats, ProgressTracker};
pub use query_engine::{DEFAULT_QUESTION, QueryEngine};
pub use vector_index::{BuildOptions, EmbeddingDrift, IndexOrigin, VectorIndex};
