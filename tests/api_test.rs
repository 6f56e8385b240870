//! HTTP-level tests against the router with stubbed services.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use pharmaguard_rag::api::router;
use pharmaguard_rag::backend::{AnalysisBackend, BackendError, VcfUpload};
use pharmaguard_rag::config::Config;
use pharmaguard_rag::guidelines::Gene;
use pharmaguard_rag::llm::{ChatModel, EmbedTask, Embedder};
use pharmaguard_rag::models::DocumentChunk;
use pharmaguard_rag::search::vector::VectorStore;
use pharmaguard_rag::state::AppState;

struct ConstantEmbedder;

#[async_trait]
impl Embedder for ConstantEmbedder {
    async fn embed(&self, texts: &[String], _task: EmbedTask) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.5]).collect())
    }
}

struct FixedModel;

#[async_trait]
impl ChatModel for FixedModel {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(r#"{"recommendation": "Avoid codeine", "alternative_drugs": ["morphine"], "dosing_guidance": null, "monitoring": "Monitor pain control", "cpic_classification": "Strong"}"#.to_string())
    }
}

/// Canned backend that remembers what it was sent.
struct StubBackend {
    reply: fn() -> Result<Value, BackendError>,
    received: Mutex<Vec<(String, usize, String)>>,
}

impl StubBackend {
    fn new(reply: fn() -> Result<Value, BackendError>) -> Self {
        Self {
            reply,
            received: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AnalysisBackend for StubBackend {
    async fn analyze(&self, vcf: VcfUpload, drugs: &str) -> Result<Value, BackendError> {
        self.received
            .lock()
            .push((vcf.file_name, vcf.bytes.len(), drugs.to_string()));
        (self.reply)()
    }
}

fn analysis_ok() -> Result<Value, BackendError> {
    Ok(json!({
        "patient_id": "PATIENT_001",
        "pharmacogenomic_profile": [{"gene": "CYP2D6", "phenotype": "Poor Metabolizer"}]
    }))
}

fn analysis_failed() -> Result<Value, BackendError> {
    Err(BackendError::Status {
        status: 503,
        body: "maintenance".to_string(),
    })
}

fn app_with_backend(dir: &std::path::Path, backend: Arc<StubBackend>) -> axum::Router {
    let mut config = Config::default();
    config.data_dir = dir.to_path_buf();

    let store = VectorStore::open_or_create(&config.vector_dir(), &config.collection).unwrap();
    store
        .add_chunks(
            vec![DocumentChunk {
                id: uuid::Uuid::new_v4(),
                gene: Gene::Cyp2d6,
                drug: "CODEINE".to_string(),
                source: "cyp2d6.pdf".to_string(),
                text: "Avoid codeine use in poor metabolizers.".to_string(),
            }],
            vec![vec![1.0, 0.5]],
        )
        .unwrap();

    let state = AppState::with_services(
        config,
        Arc::new(store),
        Arc::new(ConstantEmbedder),
        Arc::new(FixedModel),
        backend,
    );
    router(state)
}

fn app(dir: &std::path::Path) -> axum::Router {
    app_with_backend(dir, Arc::new(StubBackend::new(analysis_ok)))
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "pharmaguard-test-boundary";

fn multipart_request(vcf: Option<&str>, drugs: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    if let Some(vcf) = vcf {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"vcf\"; filename=\"patient.vcf\"\r\nContent-Type: text/plain\r\n\r\n{vcf}\r\n"
        ));
    }
    if let Some(drugs) = drugs {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"drugs\"\r\n\r\n{drugs}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/full_analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn patient() -> Value {
    json!({
        "pharmacogenomic_profile": {
            "genes": [{"gene": "CYP2D6", "phenotype": "Poor Metabolizer"}]
        },
        "drug_analysis": [{"drug": "codeine"}, {"drug": "ibuprofen"}]
    })
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, json!({"status": "PharmaGuard RAG is running"}));
}

#[tokio::test]
async fn test_collection_stats() {
    let dir = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .uri("/collection")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["collection"], "cpic_guidelines");
    assert_eq!(v["total_chunks"], 1);
    assert_eq!(v["by_gene_drug"]["CYP2D6/CODEINE"], 1);
}

#[tokio::test]
async fn test_analyze_single_drug() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json(
        "/analyze",
        &json!({"gene": "cyp2d6", "drug": "Codeine", "phenotype": "Poor Metabolizer"}),
    );
    let (status, body) = send(app(dir.path()), req).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["result"]["recommendation"], "Avoid codeine");
    assert_eq!(v["result"]["alternative_drugs"], json!(["morphine"]));
}

#[tokio::test]
async fn test_analyze_unknown_gene_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let req = post_json(
        "/analyze",
        &json!({"gene": "CYP3A5", "drug": "tacrolimus", "phenotype": "Poor Metabolizer"}),
    );
    let (status, _) = send(app(dir.path()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_analyze_direct() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = send(app(dir.path()), post_json("/batch_analyze", &patient())).await;
    assert_eq!(status, StatusCode::OK);

    let v: Value = serde_json::from_slice(&body).unwrap();
    let records = v["drug_analysis"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["drug"], "codeine");
    assert_eq!(
        records[0]["clinical_recommendation"]["recommendation"],
        "Avoid codeine"
    );
    assert_eq!(
        records[1]["clinical_recommendation"]["recommendation"],
        "No CPIC guideline mapping found for this drug."
    );
}

#[tokio::test]
async fn test_batch_analyze_unwraps_string_field() {
    let dir = tempfile::tempdir().unwrap();
    let (_, direct) = send(app(dir.path()), post_json("/batch_analyze", &patient())).await;

    let other_dir = tempfile::tempdir().unwrap();
    let wrapped = json!({"wrapper": patient().to_string()});
    let (status, unwrapped) =
        send(app(other_dir.path()), post_json("/batch_analyze", &wrapped)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(direct, unwrapped);
}

#[tokio::test]
async fn test_batch_analyze_without_profile_is_unprocessable() {
    let dir = tempfile::tempdir().unwrap();
    let body = json!({"drug_analysis": [{"drug": "codeine"}], "note": "no profile here"});
    let (status, body) = send(app(dir.path()), post_json("/batch_analyze", &body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(String::from_utf8_lossy(&body).contains("pharmacogenomic_profile"));
}

#[tokio::test]
async fn test_full_analyze_maps_drugs_to_recommendations() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(StubBackend::new(analysis_ok));
    let app = app_with_backend(dir.path(), backend.clone());

    let req = multipart_request(Some("##fileformat=VCFv4.2"), Some("Codeine, warfarin"));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);

    let v: Value = serde_json::from_slice(&body).unwrap();
    let codeine = v["Codeine"].as_object().unwrap();
    assert_eq!(codeine["recommendation"], "Avoid codeine");
    assert!(!codeine.contains_key("monitoring"));
    assert_eq!(
        v["warfarin"]["recommendation"],
        "Phenotype not found for gene CYP2C9."
    );

    let received = backend.received.lock();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].0, "patient.vcf");
    assert_eq!(received[0].2, "Codeine,warfarin");
}

#[tokio::test]
async fn test_full_analyze_requires_vcf_and_drugs() {
    let dir = tempfile::tempdir().unwrap();

    let (status, _) = send(app(dir.path()), multipart_request(None, Some("codeine"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let other_dir = tempfile::tempdir().unwrap();
    let (status, _) = send(
        app(other_dir.path()),
        multipart_request(Some("##fileformat=VCFv4.2"), Some(" , ")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_analyze_backend_failure_is_bad_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_backend(dir.path(), Arc::new(StubBackend::new(analysis_failed)));

    let req = multipart_request(Some("##fileformat=VCFv4.2"), Some("codeine"));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        String::from_utf8_lossy(&body),
        "External API returned error 503: maintenance"
    );
}
