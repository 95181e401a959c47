// file: src/database/schema.rs
// description: Arrow schema for the persisted chunk table
// reference: https://docs.rs/lancedb

use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const EMBEDDING_COLUMN: &str = "embedding";
pub const DISTANCE_COLUMN: &str = "_distance";

pub struct SchemaManager;

impl SchemaManager {
    /// Returns the Arrow schema for the chunk table with vector embeddings
    pub fn chunk_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("document_id", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("file_path", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("token_count", DataType::UInt32, false),
            Field::new(
                EMBEDDING_COLUMN,
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Dimension of the embedding column, if the schema has one.
    pub fn embedding_dim(schema: &Schema) -> Option<usize> {
        match schema.field_with_name(EMBEDDING_COLUMN).ok()?.data_type() {
            DataType::FixedSizeList(_, dim) => Some(*dim as usize),
            _ => None,
        }
    }
}
