// file: src/models/document.rs
// description: source document model loaded from the data directory
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id derived from the relative path, so a re-read file keeps its id.
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    pub relative_path: String,
    pub content: String,
    pub content_hash: String,
    pub file_size: u64,
    pub last_modified: u64,
    pub title: Option<String>,
}

impl Document {
    pub fn new(
        file_path: String,
        relative_path: String,
        content: String,
        file_size: u64,
        last_modified: u64,
    ) -> Self {
        let id = compute_hash(&relative_path);
        let content_hash = compute_hash(&content);
        let file_name = relative_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&relative_path)
            .to_string();

        Self {
            id,
            file_path,
            file_name,
            relative_path,
            content,
            content_hash,
            file_size,
            last_modified,
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

pub(crate) fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new(
            "/data/essays/growing_up.txt".to_string(),
            "essays/growing_up.txt".to_string(),
            "I wrote short stories.".to_string(),
            22,
            1234567890,
        );

        assert_eq!(doc.file_name, "growing_up.txt");
        assert_eq!(doc.file_size, 22);
        assert_eq!(doc.id.len(), 64);
        assert_ne!(doc.id, doc.content_hash);
        assert!(doc.title.is_none());
    }

    #[test]
    fn test_id_is_stable_across_content_changes() {
        let a = Document::new("a".into(), "x.md".into(), "one".into(), 3, 0);
        let b = Document::new("a".into(), "x.md".into(), "two".into(), 3, 0);
        assert_eq!(a.id, b.id);
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_hash_consistency() {
        assert_eq!(compute_hash("Test content"), compute_hash("Test content"));
    }
}
