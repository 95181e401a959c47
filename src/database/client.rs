// file: src/database/client.rs
// description: persisted vector index backed by a LanceDB directory
// reference: https://docs.rs/lancedb

use crate::database::insert::BatchBuilder;
use crate::database::manifest::IndexManifest;
use crate::database::schema::{DISTANCE_COLUMN, SchemaManager};
use crate::error::{RagError, Result};
use crate::models::{RetrievedChunk, TextChunk};
use arrow_array::{Array, Float32Array, RecordBatch, RecordBatchIterator, StringArray, UInt32Array};
use async_trait::async_trait;
use futures::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table, connect};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct IndexStore {
    persist_dir: PathBuf,
    table: Table,
    manifest: IndexManifest,
}

impl IndexStore {
    /// Writes the chunk table, then the manifest, into `persist_dir`.
    pub async fn create(
        persist_dir: &Path,
        table_name: &str,
        chunks: &[TextChunk],
        embeddings: &[Vec<f32>],
        manifest: IndexManifest,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::Validation(
                "Cannot persist an index without chunks".to_string(),
            ));
        }

        fs::create_dir_all(persist_dir).map_err(|source| RagError::FileOperation {
            path: persist_dir.to_path_buf(),
            source,
        })?;

        let connection = Self::connect(persist_dir).await?;

        let builder = BatchBuilder::new(manifest.dimensions);
        let schema = builder.schema();
        let batches = builder.build(chunks, embeddings)?;

        let table = connection
            .create_table(
                table_name,
                RecordBatchIterator::new(batches.into_iter().map(Ok), schema),
            )
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to create table {}: {}", table_name, e)))?;

        info!("Created table '{}' with {} chunks", table_name, chunks.len());

        manifest.write(persist_dir)?;

        Ok(Self {
            persist_dir: persist_dir.to_path_buf(),
            table,
            manifest,
        })
    }

    pub async fn open(persist_dir: &Path, table_name: &str) -> Result<Self> {
        if !persist_dir.exists() {
            return Err(RagError::IndexNotFound(persist_dir.to_path_buf()));
        }

        let manifest = IndexManifest::read(persist_dir)?;
        let connection = Self::connect(persist_dir).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        if !table_names.iter().any(|name| name == table_name) {
            return Err(RagError::IndexCorrupt {
                path: persist_dir.to_path_buf(),
                message: format!("table '{}' is missing", table_name),
            });
        }

        let table = connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table {}: {}", table_name, e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read schema: {}", e)))?;

        if SchemaManager::embedding_dim(&schema) != Some(manifest.dimensions) {
            return Err(RagError::IndexCorrupt {
                path: persist_dir.to_path_buf(),
                message: format!(
                    "table embedding dimension does not match manifest ({})",
                    manifest.dimensions
                ),
            });
        }

        info!(
            "Loaded index from {} ({} chunks)",
            persist_dir.display(),
            manifest.chunk_count
        );

        Ok(Self {
            persist_dir: persist_dir.to_path_buf(),
            table,
            manifest,
        })
    }

    /// Deletes the persisted index directory. Returns false if there was none.
    pub fn remove(persist_dir: &Path) -> Result<bool> {
        if !persist_dir.exists() {
            return Ok(false);
        }

        fs::remove_dir_all(persist_dir).map_err(|source| RagError::FileOperation {
            path: persist_dir.to_path_buf(),
            source,
        })?;
        warn!("Removed persisted index at {}", persist_dir.display());
        Ok(true)
    }

    async fn connect(persist_dir: &Path) -> Result<Connection> {
        let uri = persist_dir.to_string_lossy();
        debug!("Connecting to LanceDB at {}", uri);

        connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))
    }

    pub fn persist_dir(&self) -> &Path {
        &self.persist_dir
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub async fn count(&self) -> Result<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))
    }

    /// Exact cosine search, closest first.
    pub async fn search(&self, query_embedding: Vec<f32>, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if query_embedding.len() != self.manifest.dimensions {
            return Err(RagError::Validation(format!(
                "Query embedding has dimension {}, index expects {}",
                query_embedding.len(),
                self.manifest.dimensions
            )));
        }

        let mut results_stream = self
            .table
            .vector_search(query_embedding)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Vector search failed: {}", e)))?;

        let mut results = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result
                .map_err(|e| RagError::Database(format!("Failed to read result batch: {}", e)))?;
            results.extend(Self::rows_from_batch(&batch)?);
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!("Vector search returned {} results", results.len());
        Ok(results)
    }

    fn rows_from_batch(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>> {
        let ids = string_column(batch, "id")?;
        let document_ids = string_column(batch, "document_id")?;
        let file_paths = string_column(batch, "file_path")?;
        let texts = string_column(batch, "text")?;
        let chunk_indices = batch
            .column_by_name("chunk_index")
            .and_then(|col| col.as_any().downcast_ref::<UInt32Array>())
            .ok_or_else(|| RagError::Database("Missing or invalid 'chunk_index' column".to_string()))?;

        let distances = batch
            .column_by_name(DISTANCE_COLUMN)
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

        let rows = (0..batch.num_rows())
            .map(|i| {
                let distance = distances.filter(|d| !d.is_null(i)).map(|d| d.value(i));
                RetrievedChunk {
                    chunk_id: ids.value(i).to_string(),
                    document_id: document_ids.value(i).to_string(),
                    file_path: file_paths.value(i).to_string(),
                    chunk_index: chunk_indices.value(i),
                    text: texts.value(i).to_string(),
                    score: distance.map(|d| 1.0 - d).unwrap_or(0.0),
                    distance,
                }
            })
            .collect();

        Ok(rows)
    }
}

/// Nearest-chunk lookup used by the query engine.
#[async_trait]
pub trait ChunkSearch: Send + Sync {
    async fn search(&self, query_embedding: Vec<f32>, top_k: usize) -> Result<Vec<RetrievedChunk>>;
}

#[async_trait]
impl ChunkSearch for IndexStore {
    async fn search(&self, query_embedding: Vec<f32>, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        IndexStore::search(self, query_embedding, top_k).await
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid '{}' column type", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manifest::{MANIFEST_FILE, MANIFEST_VERSION};
    use chrono::Utc;
    use tempfile::TempDir;

    fn manifest(dimensions: usize, chunk_count: usize) -> IndexManifest {
        IndexManifest {
            version: MANIFEST_VERSION,
            embedding_model: "fake".to_string(),
            dimensions,
            chunk_size: 1024,
            chunk_overlap: 20,
            document_count: 1,
            chunk_count,
            created_at: Utc::now(),
            documents: vec![],
        }
    }

    fn chunk(i: u32, text: &str) -> TextChunk {
        TextChunk::new("doc", "essay.txt", i, text.to_string(), 1)
    }

    #[tokio::test]
    async fn test_create_open_and_search() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("storage");

        let chunks = vec![chunk(0, "north"), chunk(1, "east"), chunk(2, "mostly north")];
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]];

        IndexStore::create(&dir, "chunks", &chunks, &embeddings, manifest(2, 3))
            .await
            .unwrap();
        assert!(dir.join(MANIFEST_FILE).exists());

        let store = IndexStore::open(&dir, "chunks").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        let results = store.search(vec![1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "north");
        assert_eq!(results[1].text, "mostly north");
        assert!(results[0].score >= results[1].score);
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_open_missing_dir() {
        let temp = TempDir::new().unwrap();
        let err = IndexStore::open(&temp.path().join("nope"), "chunks")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RagError::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_open_without_manifest_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let err = IndexStore::open(temp.path(), "chunks").await.err().unwrap();
        assert!(matches!(err, RagError::IndexCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_query_dimension_checked() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::create(
            temp.path(),
            "chunks",
            &[chunk(0, "only")],
            &[vec![1.0, 0.0, 0.0]],
            manifest(3, 1),
        )
        .await
        .unwrap();

        assert!(store.search(vec![1.0, 0.0], 1).await.is_err());
    }

    #[test]
    fn test_remove() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("storage");
        assert!(!IndexStore::remove(&dir).unwrap());

        fs::create_dir_all(&dir).unwrap();
        assert!(IndexStore::remove(&dir).unwrap());
        assert!(!dir.exists());
    }
}
