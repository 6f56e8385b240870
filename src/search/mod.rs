//! Gene/drug-scoped semantic retrieval over the guideline collection.

pub mod vector;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::guidelines::Gene;
use crate::llm::{EmbedTask, Embedder};
use crate::models::ChunkHit;
use vector::VectorStore;

/// Filtered top-k retrieval: only chunks tagged with exactly `gene` and
/// `drug` are candidates, ranked by similarity to `query`.
#[async_trait]
pub trait ChunkSearch: Send + Sync {
    async fn search(&self, gene: Gene, drug: &str, query: &str, k: usize) -> Result<Vec<ChunkHit>>;
}

/// Embeds the query and searches the vector store.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }
}

#[async_trait]
impl ChunkSearch for Retriever {
    async fn search(&self, gene: Gene, drug: &str, query: &str, k: usize) -> Result<Vec<ChunkHit>> {
        let query_embedding = self
            .embedder
            .embed(&[query.to_string()], EmbedTask::Query)
            .await?
            .into_iter()
            .next()
            .context("No embedding returned for query")?;

        let hits = self.store.search(&query_embedding, gene, drug, k);
        tracing::debug!("Retrieved {} chunks for {gene}/{drug}", hits.len());
        Ok(hits)
    }
}
