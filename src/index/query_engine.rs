// file: src/index/query_engine.rs
// description: retrieval plus answer synthesis over the persisted index
// reference: context-stuffing question answering

use crate::database::ChunkSearch;
use crate::error::{RagError, Result};
use crate::llm::{ChatMessage, ChatModel, EmbeddingModel};
use crate::models::{Response, RetrievedChunk};
use tracing::{debug, info};

pub const DEFAULT_QUESTION: &str = "What did the author do growing up? 日本語で答えてください。";

pub const SYSTEM_PROMPT: &str = "You are an expert Q&A system that is trusted around the world.\n\
Always answer the query using the provided context information, and not prior knowledge.\n\
Some rules to follow:\n\
1. Never directly reference the given context in your answer.\n\
2. Avoid statements like 'Based on the context, ...' or 'The context information ...' or anything along those lines.";

pub struct QueryEngine<'a> {
    store: &'a dyn ChunkSearch,
    embedder: &'a dyn EmbeddingModel,
    chat: &'a dyn ChatModel,
    top_k: usize,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        store: &'a dyn ChunkSearch,
        embedder: &'a dyn EmbeddingModel,
        chat: &'a dyn ChatModel,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
            top_k: top_k.max(1),
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::Validation("Query must not be empty".to_string()));
        }

        let embedding = self.embedder.embed_query(question).await?;
        let chunks = self.store.search(embedding, self.top_k).await?;

        debug!(
            "Retrieved {} chunks: {:?}",
            chunks.len(),
            chunks.iter().map(|c| c.score).collect::<Vec<_>>()
        );
        Ok(chunks)
    }

    pub async fn query(&self, question: &str) -> Result<Response> {
        let sources = self.retrieve(question).await?;

        if sources.is_empty() {
            info!("No context retrieved, skipping the model call");
            return Ok(Response::empty());
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(question.trim(), &sources)),
        ];

        let answer = self.chat.complete(&messages).await?;
        let answer = answer.trim();

        Ok(Response {
            answer: if answer.is_empty() {
                Response::EMPTY.to_string()
            } else {
                answer.to_string()
            },
            sources,
        })
    }
}

pub fn build_prompt(question: &str, sources: &[RetrievedChunk]) -> String {
    let context = sources
        .iter()
        .map(|chunk| format!("file_path: {}\n\n{}", chunk.file_path, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {question}\n\
         Answer: "
    )
}
