// file: src/index/vector_index.rs
// description: builds a vector index from documents or loads the persisted one
// reference: chunk, embed, persist, reload

use crate::config::{Config, OpenAiConfig, StorageConfig};
use crate::database::manifest::MANIFEST_VERSION;
use crate::database::{IndexManifest, IndexStore, ManifestDocument};
use crate::error::{RagError, Result};
use crate::index::chunker::SentenceSplitter;
use crate::index::progress::{BuildStats, ProgressTracker};
use crate::index::query_engine::QueryEngine;
use crate::llm::{ChatModel, EmbeddingModel};
use crate::models::{Document, TextChunk};
use crate::reader::DirectoryReader;
use chrono::Utc;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STAGING_SUFFIX: &str = ".building";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    Built,
    Loaded,
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub embedding_batch_size: usize,
    pub show_progress: bool,
    pub colored: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            embedding_batch_size: OpenAiConfig::default().embedding_batch_size,
            show_progress: false,
            colored: false,
        }
    }
}

/// Embedding model recorded in the manifest versus the one now configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingDrift {
    pub indexed: String,
    pub configured: String,
}

pub struct VectorIndex {
    store: IndexStore,
    build_stats: Option<BuildStats>,
    drift: Option<EmbeddingDrift>,
}

impl VectorIndex {
    /// Chunks and embeds `documents`, then persists the result under
    /// `storage.persist_dir`. A failed write leaves no directory behind.
    pub async fn from_documents(
        documents: &[Document],
        splitter: &SentenceSplitter,
        embedder: &dyn EmbeddingModel,
        storage: &StorageConfig,
        options: &BuildOptions,
    ) -> Result<Self> {
        if storage.persist_dir.exists() {
            return Err(RagError::Validation(format!(
                "{} already exists; reset it before rebuilding",
                storage.persist_dir.display()
            )));
        }

        let chunks = splitter.split_documents(documents);
        if chunks.is_empty() {
            return Err(RagError::Validation(
                "Documents contain no text to index".to_string(),
            ));
        }

        info!(
            "Embedding {} chunks from {} documents with {}",
            chunks.len(),
            documents.len(),
            embedder.model_name()
        );

        let progress = ProgressTracker::new(
            documents.len(),
            chunks.len(),
            options.show_progress,
            options.colored,
        );
        let embeddings = embed_chunks(&chunks, embedder, options.embedding_batch_size, &progress).await?;
        let dimensions = check_dimensions(&embeddings)?;

        let manifest = build_manifest(documents, &chunks, splitter, embedder.model_name(), dimensions);

        let persist_dir = &storage.persist_dir;
        let store = match IndexStore::create(
            persist_dir,
            &storage.table_name,
            &chunks,
            &embeddings,
            manifest,
        )
        .await
        {
            Ok(store) => store,
            Err(e) => {
                if let Err(cleanup) = IndexStore::remove(persist_dir) {
                    warn!("Failed to clean up partial index: {}", cleanup);
                }
                return Err(e);
            }
        };

        progress.finish();
        let stats = progress.get_stats();
        info!(
            "Persisted index to {}: {} chunks, {:.1} tokens/chunk, {:.2} chunks/sec",
            persist_dir.display(),
            stats.chunks_embedded,
            stats.avg_tokens_per_chunk(),
            stats.chunks_per_second()
        );

        Ok(Self {
            store,
            build_stats: Some(stats),
            drift: None,
        })
    }

    /// Opens the index persisted in `storage.persist_dir`.
    pub async fn load(storage: &StorageConfig, embedding_model: &str) -> Result<Self> {
        let store = IndexStore::open(&storage.persist_dir, &storage.table_name).await?;

        let manifest = store.manifest();
        let drift = (manifest.embedding_model != embedding_model).then(|| EmbeddingDrift {
            indexed: manifest.embedding_model.clone(),
            configured: embedding_model.to_string(),
        });
        if let Some(drift) = &drift {
            warn!(
                "Index was built with '{}' but '{}' is configured; queries use the configured model",
                drift.indexed, drift.configured
            );
        }

        Ok(Self {
            store,
            build_stats: None,
            drift,
        })
    }

    /// Builds from `storage.data_dir` when `storage.persist_dir` does not
    /// exist yet, otherwise loads it.
    pub async fn load_or_build(
        config: &Config,
        embedder: &dyn EmbeddingModel,
        options: &BuildOptions,
    ) -> Result<(Self, IndexOrigin)> {
        let storage = &config.storage;

        if storage.persist_dir.exists() {
            info!("Loading existing index from {}", storage.persist_dir.display());
            let index = Self::load(storage, embedder.model_name()).await?;
            return Ok((index, IndexOrigin::Loaded));
        }

        info!(
            "No index at {}, building from {}",
            storage.persist_dir.display(),
            storage.data_dir.display()
        );
        let index = Self::build(config, embedder, options).await?;
        Ok((index, IndexOrigin::Built))
    }

    /// Reads `storage.data_dir` and builds a fresh index from it.
    pub async fn build(
        config: &Config,
        embedder: &dyn EmbeddingModel,
        options: &BuildOptions,
    ) -> Result<Self> {
        Self::build_into(config, &config.storage, embedder, options).await
    }

    /// Builds into a sibling staging directory and swaps it over
    /// `storage.persist_dir` only once complete. A failed rebuild leaves the
    /// existing index untouched.
    pub async fn rebuild(
        config: &Config,
        embedder: &dyn EmbeddingModel,
        options: &BuildOptions,
    ) -> Result<Self> {
        let persist_dir = &config.storage.persist_dir;
        let staging = staging_dir(persist_dir)?;
        if IndexStore::remove(&staging)? {
            warn!("Removed leftover staging directory {}", staging.display());
        }

        let staged_storage = StorageConfig {
            persist_dir: staging.clone(),
            ..config.storage.clone()
        };
        let Self {
            store, build_stats, ..
        } = Self::build_into(config, &staged_storage, embedder, options).await?;
        drop(store);

        IndexStore::remove(persist_dir)?;
        fs::rename(&staging, persist_dir).map_err(|source| RagError::FileOperation {
            path: persist_dir.clone(),
            source,
        })?;
        info!("Swapped rebuilt index into {}", persist_dir.display());

        let mut index = Self::load(&config.storage, embedder.model_name()).await?;
        index.build_stats = build_stats;
        Ok(index)
    }

    async fn build_into(
        config: &Config,
        storage: &StorageConfig,
        embedder: &dyn EmbeddingModel,
        options: &BuildOptions,
    ) -> Result<Self> {
        let data_dir = storage.data_dir.clone();
        let reader_config = config.reader.clone();

        let documents = tokio::task::spawn_blocking(move || {
            DirectoryReader::new(reader_config).load_data(&data_dir)
        })
        .await
        .map_err(|e| RagError::Reader(format!("Document loading task failed: {}", e)))??;

        let splitter = SentenceSplitter::new(config.index.chunk_size, config.index.chunk_overlap);
        Self::from_documents(&documents, &splitter, embedder, storage, options).await
    }

    pub fn as_query_engine<'a>(
        &'a self,
        embedder: &'a dyn EmbeddingModel,
        chat: &'a dyn ChatModel,
        top_k: usize,
    ) -> QueryEngine<'a> {
        QueryEngine::new(&self.store, embedder, chat, top_k)
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn manifest(&self) -> &IndexManifest {
        self.store.manifest()
    }

    pub fn build_stats(&self) -> Option<&BuildStats> {
        self.build_stats.as_ref()
    }

    pub fn embedding_drift(&self) -> Option<&EmbeddingDrift> {
        self.drift.as_ref()
    }
}

fn staging_dir(persist_dir: &Path) -> Result<PathBuf> {
    let name = persist_dir.file_name().ok_or_else(|| {
        RagError::Validation(format!(
            "{} does not name a directory that can be rebuilt",
            persist_dir.display()
        ))
    })?;

    let mut staged = OsString::from(name);
    staged.push(STAGING_SUFFIX);
    Ok(persist_dir.with_file_name(staged))
}

async fn embed_chunks(
    chunks: &[TextChunk],
    embedder: &dyn EmbeddingModel,
    batch_size: usize,
    progress: &ProgressTracker,
) -> Result<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        if vectors.len() != batch.len() {
            return Err(RagError::Validation(format!(
                "Embedding model returned {} vectors for {} inputs",
                vectors.len(),
                batch.len()
            )));
        }

        let tokens: u64 = batch.iter().map(|c| c.token_count as u64).sum();
        progress.add_embedded(batch.len(), tokens);
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

fn check_dimensions(embeddings: &[Vec<f32>]) -> Result<usize> {
    let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
    if dimensions == 0 {
        return Err(RagError::Validation(
            "Embedding model returned empty vectors".to_string(),
        ));
    }

    if embeddings.iter().any(|e| e.len() != dimensions) {
        return Err(RagError::Validation(
            "Embedding model returned vectors of differing dimension".to_string(),
        ));
    }

    Ok(dimensions)
}

fn build_manifest(
    documents: &[Document],
    chunks: &[TextChunk],
    splitter: &SentenceSplitter,
    embedding_model: &str,
    dimensions: usize,
) -> IndexManifest {
    let mut per_document: HashMap<&str, usize> = HashMap::new();
    for chunk in chunks {
        *per_document.entry(chunk.document_id.as_str()).or_default() += 1;
    }

    IndexManifest {
        version: MANIFEST_VERSION,
        embedding_model: embedding_model.to_string(),
        dimensions,
        chunk_size: splitter.chunk_size(),
        chunk_overlap: splitter.chunk_overlap(),
        document_count: documents.len(),
        chunk_count: chunks.len(),
        created_at: Utc::now(),
        documents: documents
            .iter()
            .map(|doc| ManifestDocument {
                id: doc.id.clone(),
                relative_path: doc.relative_path.clone(),
                content_hash: doc.content_hash.clone(),
                chunk_count: per_document.get(doc.id.as_str()).copied().unwrap_or(0),
            })
            .collect(),
    }
}
