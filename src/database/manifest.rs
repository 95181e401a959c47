// file: src/database/manifest.rs
// description: index manifest written next to the LanceDB table
// reference: https://docs.rs/serde_json

use crate::error::{RagError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const MANIFEST_FILE: &str = "index_meta.json";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub embedding_model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub document_count: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    pub documents: Vec<ManifestDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub id: String,
    pub relative_path: String,
    pub content_hash: String,
    pub chunk_count: usize,
}

impl IndexManifest {
    /// The manifest is written last, so its presence marks a complete index.
    pub fn write(&self, persist_dir: &Path) -> Result<()> {
        let path = persist_dir.join(MANIFEST_FILE);
        let tmp = persist_dir.join(format!("{}.tmp", MANIFEST_FILE));

        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json).map_err(|source| RagError::FileOperation {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| RagError::FileOperation { path, source })?;
        Ok(())
    }

    pub fn read(persist_dir: &Path) -> Result<Self> {
        let path = persist_dir.join(MANIFEST_FILE);

        let raw = fs::read_to_string(&path).map_err(|e| RagError::IndexCorrupt {
            path: persist_dir.to_path_buf(),
            message: format!("cannot read {}: {}", MANIFEST_FILE, e),
        })?;

        let manifest: IndexManifest =
            serde_json::from_str(&raw).map_err(|e| RagError::IndexCorrupt {
                path: persist_dir.to_path_buf(),
                message: format!("malformed {}: {}", MANIFEST_FILE, e),
            })?;

        if manifest.version != MANIFEST_VERSION {
            return Err(RagError::IndexCorrupt {
                path: persist_dir.to_path_buf(),
                message: format!(
                    "unsupported manifest version {} (expected {})",
                    manifest.version, MANIFEST_VERSION
                ),
            });
        }

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> IndexManifest {
        IndexManifest {
            version: MANIFEST_VERSION,
            embedding_model: "text-embedding-ada-002".to_string(),
            dimensions: 3,
            chunk_size: 1024,
            chunk_overlap: 20,
            document_count: 1,
            chunk_count: 2,
            created_at: Utc::now(),
            documents: vec![ManifestDocument {
                id: "abc".to_string(),
                relative_path: "essay.txt".to_string(),
                content_hash: "def".to_string(),
                chunk_count: 2,
            }],
        }
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let manifest = sample();
        manifest.write(temp.path()).unwrap();

        assert!(!temp.path().join("index_meta.json.tmp").exists());
        assert_eq!(IndexManifest::read(temp.path()).unwrap(), manifest);
    }

    #[test]
    fn test_missing_or_malformed_is_corrupt() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            IndexManifest::read(temp.path()),
            Err(RagError::IndexCorrupt { .. })
        ));

        fs::write(temp.path().join(MANIFEST_FILE), "{not json").unwrap();
        assert!(matches!(
            IndexManifest::read(temp.path()),
            Err(RagError::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let mut manifest = sample();
        manifest.version = 99;
        manifest.write(temp.path()).unwrap();

        let err = IndexManifest::read(temp.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported manifest version 99"));
    }
}
