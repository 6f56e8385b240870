use std::sync::Arc;
use std::time::Duration;

use crate::backend::{AnalysisBackend, HttpAnalysisBackend};
use crate::config::Config;
use crate::llm::completion::HttpChatModel;
use crate::llm::embeddings::HttpEmbedder;
use crate::llm::recommend::RecommendationGenerator;
use crate::llm::{ChatModel, Embedder};
use crate::pipeline::EnrichmentPipeline;
use crate::search::vector::VectorStore;
use crate::search::Retriever;

/// Shared application state. Every service is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<VectorStore>,
    pub pipeline: Arc<EnrichmentPipeline>,
    pub backend: Arc<dyn AnalysisBackend>,
}

impl AppState {
    /// Open the collection and wire the HTTP-backed embedder, LLM and
    /// analysis backend.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = VectorStore::open_or_create(&config.vector_dir(), &config.collection)?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        let embedder = Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let llm = Arc::new(HttpChatModel::new(http_client.clone(), config.llm.clone()));
        let backend = Arc::new(HttpAnalysisBackend::new(
            http_client,
            config.backend.clone(),
        ));

        Ok(Self::with_services(config, Arc::new(store), embedder, llm, backend))
    }

    /// Assemble state from already-built services.
    pub fn with_services(
        config: Config,
        store: Arc<VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
        backend: Arc<dyn AnalysisBackend>,
    ) -> Self {
        let retriever = Retriever::new(store.clone(), embedder);
        let pipeline = EnrichmentPipeline::new(
            Arc::new(retriever),
            RecommendationGenerator::new(llm),
            config.retrieval_k,
        );

        Self {
            config,
            store,
            pipeline: Arc::new(pipeline),
            backend,
        }
    }
}
