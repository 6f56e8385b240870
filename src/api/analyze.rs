use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::guidelines::Gene;
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::pipeline::PROFILE_KEY;
use crate::state::AppState;

/// POST /analyze - one gene/drug/phenotype triple
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    let gene = Gene::parse(&req.gene).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Unknown gene: {}", req.gene),
        )
    })?;

    let result = state
        .pipeline
        .recommend_for(gene, &req.drug, &req.phenotype)
        .await
        .map_err(|e| {
            tracing::error!("Analysis failed for {gene}/{}: {e:#}", req.drug);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Retrieval error: {e}"),
            )
        })?;

    Ok(Json(AnalyzeResponse { result }))
}

/// POST /batch_analyze - enrich a whole patient payload
pub async fn batch_analyze(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let patient = locate_patient_payload(body).ok_or_else(|| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Request body does not contain a {PROFILE_KEY}, directly or in any top-level field"),
        )
    })?;

    let enriched = state.pipeline.enrich(patient).await.map_err(|e| {
        tracing::error!("Batch enrichment failed: {e:#}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Retrieval error: {e}"),
        )
    })?;

    Ok(Json(enriched))
}

/// Find the patient payload in a request body.
///
/// A body carrying the profile key at top level is used as-is. Otherwise
/// each top-level value is tried in key order: a string mentioning the key
/// that parses as a JSON object, or an object holding the key. First match
/// wins. This is a compatibility shim for clients that wrap the payload.
pub fn locate_patient_payload(body: Value) -> Option<Value> {
    let Value::Object(fields) = body else {
        return None;
    };
    if fields.contains_key(PROFILE_KEY) {
        return Some(Value::Object(fields));
    }

    for (key, value) in fields {
        match value {
            Value::String(text) if text.contains(PROFILE_KEY) => {
                match serde_json::from_str::<Value>(&text) {
                    Ok(parsed @ Value::Object(_)) => {
                        tracing::debug!("Unwrapped patient payload from string field {key:?}");
                        return Some(parsed);
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::debug!("Field {key:?} mentions {PROFILE_KEY} but is not JSON: {e}");
                        continue;
                    }
                }
            }
            Value::Object(ref inner) if inner.contains_key(PROFILE_KEY) => {
                tracing::debug!("Using nested patient payload from field {key:?}");
                return Some(value);
            }
            _ => {}
        }
    }

    None
}
