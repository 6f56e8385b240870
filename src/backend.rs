//! Client for the external VCF analysis backend (`POST {base}/api/analyze`).

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("External API returned error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to reach external API at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("External API at {url} returned an unreadable body: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// An uploaded VCF file.
#[derive(Debug, Clone)]
pub struct VcfUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Turns a VCF plus a drug list into a patient analysis payload.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// `drugs` is forwarded verbatim as the comma-separated `drug` field.
    async fn analyze(&self, vcf: VcfUpload, drugs: &str) -> Result<Value, BackendError>;
}

/// HTTP implementation with a fixed per-request timeout.
pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpAnalysisBackend {
    pub fn new(client: reqwest::Client, config: BackendConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze(&self, vcf: VcfUpload, drugs: &str) -> Result<Value, BackendError> {
        let url = self.config.analyze_url();

        let part = reqwest::multipart::Part::bytes(vcf.bytes).file_name(vcf.file_name);
        let form = reqwest::multipart::Form::new()
            .part("vcf", part)
            .text("drug", drugs.to_string());

        tracing::info!("Forwarding VCF analysis to {url}");
        let resp = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .multipart(form)
            .send()
            .await
            .map_err(|source| BackendError::Unreachable {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|source| BackendError::InvalidBody { url, source })
    }
}
