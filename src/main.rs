use tracing_subscriber::EnvFilter;

use pharmaguard_rag::api;
use pharmaguard_rag::config::Config;
use pharmaguard_rag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.llm.api_key.is_none() && config.llm.provider != "ollama" {
        tracing::warn!("No LLM API key set (GEMINI_API_KEY / LLM_API_KEY)");
    }

    let state = AppState::new(config.clone())?;
    if state.store.count() == 0 {
        tracing::warn!(
            "Collection {} is empty; run pharmaguard-ingest first",
            state.store.name()
        );
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
