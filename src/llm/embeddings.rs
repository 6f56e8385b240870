use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbedTask, Embedder};
use crate::config::LlmConfig;

/// Maximum characters sent per text. Chunks are ~1500 chars, so this only
/// bites on oversized queries.
const MAX_EMBED_CHARS: usize = 6_000;

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Embedding client for the configured provider.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String], task: EmbedTask) -> Result<Vec<Vec<f32>>> {
        embed_batch(&self.client, &self.config, texts, task).await
    }
}

/// Generate embeddings for a batch of texts using the configured provider.
pub async fn embed_batch(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
    task: EmbedTask,
) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let truncated: Vec<String> = texts
        .iter()
        .map(|t| truncate_for_embedding(t).to_string())
        .collect();

    let embeddings = match config.provider.as_str() {
        "gemini" => embed_gemini(client, config, &truncated, task).await?,
        "ollama" => embed_ollama(client, config, &truncated).await?,
        "openai" => embed_openai(client, config, &truncated).await?,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    if embeddings.len() != texts.len() {
        anyhow::bail!(
            "Embedding API returned {} vectors for {} texts",
            embeddings.len(),
            texts.len()
        );
    }
    Ok(embeddings)
}

// ─── Gemini ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedRequest {
    model: String,
    content: GeminiContent,
    task_type: &'static str,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiBatchRequest {
    requests: Vec<GeminiEmbedRequest>,
}

#[derive(Deserialize)]
struct GeminiBatchResponse {
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

async fn embed_gemini(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
    task: EmbedTask,
) -> Result<Vec<Vec<f32>>> {
    let url = format!(
        "{}/v1beta/models/{}:batchEmbedContents",
        config.base_url.trim_end_matches('/'),
        config.embedding_model
    );
    let api_key = config.api_key.as_deref().unwrap_or_default();
    let task_type = match task {
        EmbedTask::Query => "RETRIEVAL_QUERY",
        EmbedTask::Document => "RETRIEVAL_DOCUMENT",
    };

    // batchEmbedContents accepts at most 100 requests
    let batch_size = 100;
    let mut all_embeddings = Vec::new();

    for chunk in texts.chunks(batch_size) {
        let req = GeminiBatchRequest {
            requests: chunk
                .iter()
                .map(|t| GeminiEmbedRequest {
                    model: format!("models/{}", config.embedding_model),
                    content: GeminiContent {
                        parts: vec![GeminiPart { text: t.clone() }],
                    },
                    task_type,
                })
                .collect(),
        };

        let resp = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&req)
            .send()
            .await
            .context("Failed to call Gemini embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini embed API returned {status}: {body}");
        }

        let body: GeminiBatchResponse = resp
            .json()
            .await
            .context("Failed to parse Gemini embed response")?;

        all_embeddings.extend(body.embeddings.into_iter().map(|e| e.values));
    }

    Ok(all_embeddings)
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", config.base_url.trim_end_matches('/'));

    let batch_size = 32;
    let mut all_embeddings = Vec::new();

    for chunk in texts.chunks(batch_size) {
        let req = OllamaEmbedRequest {
            model: config.embedding_model.clone(),
            input: chunk.to_vec(),
            truncate: true,
        };

        let resp = client
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call Ollama embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embed API returned {status}: {body}");
        }

        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;

        all_embeddings.extend(body.embeddings);
    }

    Ok(all_embeddings)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/v1/embeddings", config.base_url.trim_end_matches('/'));
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let batch_size = 64;
    let mut all_embeddings = Vec::new();

    for chunk in texts.chunks(batch_size) {
        let req = OpenAiEmbedRequest {
            model: config.embedding_model.clone(),
            input: chunk.to_vec(),
        };

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .context("Failed to call OpenAI embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI embed API returned {status}: {body}");
        }

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse OpenAI embed response")?;

        all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
    }

    Ok(all_embeddings)
}
