//! Clients for the hosted models plus the recommendation generator.
//!
//! The embedding model and the LLM sit behind [`Embedder`] and [`ChatModel`]
//! so the server builds each once at startup and tests can swap in stubs.

pub mod completion;
pub mod embeddings;
pub mod recommend;

use anyhow::Result;
use async_trait::async_trait;

/// What a text is being embedded for. Some providers embed queries and
/// documents differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTask {
    Query,
    Document,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed `texts` in order; the result is parallel with the input.
    async fn embed(&self, texts: &[String], task: EmbedTask) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Single-turn completion. Returns the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
