// file: src/models/chunk.rs
// description: text chunk produced by the splitter and stored in the index
// reference: internal data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: u32,
    pub file_path: String,
    pub text: String,
    pub token_count: u32,
}

impl TextChunk {
    pub fn new(
        document_id: &str,
        file_path: &str,
        chunk_index: u32,
        text: String,
        token_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            chunk_index,
            file_path: file_path.to_string(),
            text,
            token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_ids_are_unique() {
        let a = TextChunk::new("doc", "a.txt", 0, "alpha".to_string(), 2);
        let b = TextChunk::new("doc", "a.txt", 1, "beta".to_string(), 1);
        assert_ne!(a.id, b.id);
        assert_eq!(a.document_id, b.document_id);
    }
}
