// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod database;
pub mod error;
pub mod index;
pub mod llm;
pub mod models;
pub mod parser;
pub mod reader;
pub mod utils;

pub use config::{Config, IndexConfig, LegacyEnv, OpenAiConfig, ReaderConfig, StorageConfig};
pub use database::{ChunkSearch, IndexManifest, IndexStore};
pub use error::{RagError, Result};
pub use index::{
    BuildOptions, BuildStats, DEFAULT_QUESTION, EmbeddingDrift, IndexOrigin, QueryEngine,
    SentenceSplitter, VectorIndex,
};
pub use llm::{ChatMessage, ChatModel, EmbeddingModel, OpenAiClient};
pub use models::{Document, Response, RetrievedChunk, TextChunk};
pub use reader::DirectoryReader;
pub use utils::OperationTimer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default();
        let _splitter = SentenceSplitter::new(config.index.chunk_size, config.index.chunk_overlap);
        let _reader = DirectoryReader::new(config.reader.clone());
        assert!(DEFAULT_QUESTION.contains("growing up"));
    }
}
