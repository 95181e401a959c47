// file: src/models/search_result.rs
// description: retrieval results and the query response
// reference: Used for vector similarity search results

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub file_path: String,
    pub chunk_index: u32,
    pub text: String,

    /// Cosine similarity, higher is closer
    pub score: f32,

    /// Raw cosine distance reported by the store
    pub distance: Option<f32>,
}

impl RetrievedChunk {
    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_chars: usize) -> String {
        let preview = if self.text.chars().count() > max_content_chars {
            let cut: String = self.text.chars().take(max_content_chars).collect();
            format!("{}...", cut)
        } else {
            self.text.clone()
        };

        format!(
            "Score: {:.4} | {} (chunk {})\n{}\n",
            self.score, self.file_path, self.chunk_index, preview
        )
    }
}

/// Answer text plus the chunks it was synthesised from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
}

impl Response {
    pub const EMPTY: &'static str = "Empty Response";

    pub fn empty() -> Self {
        Self {
            answer: Self::EMPTY.to_string(),
            sources: Vec::new(),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.answer)
    }
}
