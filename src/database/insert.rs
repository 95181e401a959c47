// file: src/database/insert.rs
// description: Arrow record batch construction for chunks and their embeddings
// reference: https://docs.rs/lancedb

use crate::database::schema::SchemaManager;
use crate::error::{RagError, Result};
use crate::models::TextChunk;
use arrow_array::{FixedSizeListArray, Float32Array, RecordBatch, StringArray, UInt32Array};
use arrow_schema::Schema;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_ROWS_PER_BATCH: usize = 256;

pub struct BatchBuilder {
    schema: Arc<Schema>,
    dimensions: usize,
    rows_per_batch: usize,
}

impl BatchBuilder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            schema: SchemaManager::chunk_schema(dimensions),
            dimensions,
            rows_per_batch: DEFAULT_ROWS_PER_BATCH,
        }
    }

    pub fn with_rows_per_batch(mut self, rows: usize) -> Self {
        self.rows_per_batch = rows.max(1);
        self
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    /// Splits the rows into record batches of at most `rows_per_batch`.
    pub fn build(&self, chunks: &[TextChunk], embeddings: &[Vec<f32>]) -> Result<Vec<RecordBatch>> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::Validation(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(RagError::Validation(format!(
                "Embedding has dimension {}, expected {}",
                bad.len(),
                self.dimensions
            )));
        }

        let batches = chunks
            .chunks(self.rows_per_batch)
            .zip(embeddings.chunks(self.rows_per_batch))
            .map(|(c, e)| self.create_record_batch(c, e))
            .collect::<Result<Vec<_>>>()?;

        debug!("Built {} record batches for {} chunks", batches.len(), chunks.len());
        Ok(batches)
    }

    fn create_record_batch(&self, chunks: &[TextChunk], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
        let ids: StringArray = chunks.iter().map(|c| Some(c.id.as_str())).collect();
        let document_ids: StringArray = chunks.iter().map(|c| Some(c.document_id.as_str())).collect();
        let chunk_indices: UInt32Array = chunks.iter().map(|c| Some(c.chunk_index)).collect();
        let file_paths: StringArray = chunks.iter().map(|c| Some(c.file_path.as_str())).collect();
        let texts: StringArray = chunks.iter().map(|c| Some(c.text.as_str())).collect();
        let token_counts: UInt32Array = chunks.iter().map(|c| Some(c.token_count)).collect();

        let embedding_values: Float32Array = embeddings
            .iter()
            .flat_map(|emb| emb.iter().copied())
            .collect();

        let embedding_list =
            FixedSizeListArray::try_new_from_values(embedding_values, self.dimensions as i32)
                .map_err(|e| {
                    RagError::Database(format!("Failed to create embedding array: {}", e))
                })?;

        RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(ids),
                Arc::new(document_ids),
                Arc::new(chunk_indices),
                Arc::new(file_paths),
                Arc::new(texts),
                Arc::new(token_counts),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(n: usize) -> Vec<TextChunk> {
        (0..n)
            .map(|i| TextChunk::new("doc", "a.txt", i as u32, format!("chunk {i}"), 2))
            .collect()
    }

    #[test]
    fn test_batches_split_by_row_limit() {
        let builder = BatchBuilder::new(2).with_rows_per_batch(2);
        let embeddings = vec![vec![0.1, 0.2]; 5];
        let batches = builder.build(&chunks(5), &embeddings).unwrap();

        let sizes: Vec<usize> = batches.iter().map(|b| b.num_rows()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(batches[0].num_columns(), 7);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let builder = BatchBuilder::new(3);
        let err = builder
            .build(&chunks(1), &[vec![0.1, 0.2]])
            .unwrap_err();
        assert!(matches!(err, RagError::Validation(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let builder = BatchBuilder::new(2);
        assert!(builder.build(&chunks(2), &[vec![0.1, 0.2]]).is_err());
    }
}
