//! HTTP surface.

pub mod analyze;
pub mod full;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::models::{CollectionStats, HealthResponse};
use crate::state::AppState;

/// VCF uploads routinely exceed axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/collection", get(collection))
        .route("/analyze", post(analyze::analyze))
        .route("/batch_analyze", post(analyze::batch_analyze))
        .route(
            "/full_analyze",
            post(full::full_analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "PharmaGuard RAG is running",
    })
}

/// GET /collection - chunk counts per gene/drug
pub async fn collection(State(state): State<AppState>) -> Json<CollectionStats> {
    Json(CollectionStats {
        collection: state.store.name().to_string(),
        total_chunks: state.store.count(),
        by_gene_drug: state.store.counts_by_gene_drug(),
    })
}
