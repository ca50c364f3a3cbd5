//! Embedding and chat collaborators behind narrow async traits.
//!
//! The pipeline depends only on these two contracts; the shipped
//! implementations are OpenAI-compatible HTTP clients and deterministic
//! in-process mocks for tests and offline runs.

mod mock;
mod openai;

pub use mock::{MockChatProvider, MockEmbeddingProvider};
pub use openai::{OpenAiChatProvider, OpenAiEmbeddingProvider};

use async_trait::async_trait;

use crate::types::RagError;

/// Maps text to a fixed-length vector; deterministic for identical text
/// under a fixed model identifier.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Batch variant; the default loops over [`EmbeddingProvider::embed`].
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Chat completion collaborator: a system prompt plus one user turn in,
/// raw text out. No streaming.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str)
    -> Result<String, RagError>;
}
