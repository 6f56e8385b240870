use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the vector collection is persisted
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Directory holding the per-gene CPIC guideline PDFs
    pub docs_dir: PathBuf,
    /// Vector collection name
    pub collection: String,
    /// Chunks retrieved per drug
    pub retrieval_k: usize,
    /// Ingestion chunking parameters
    pub chunking: ChunkingConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// External VCF analysis backend
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "gemini", "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for recommendation generation
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (not needed for ollama)
    pub api_key: Option<String>,
    /// Sampling temperature for generation
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            chat_model: "gemini-2.5-flash".to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            api_key: None,
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the analysis backend; requests go to `{base_url}/api/analyze`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub fn analyze_url(&self) -> String {
        format!("{}/api/analyze", self.base_url.trim_end_matches('/'))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:8001".to_string(),
            docs_dir: PathBuf::from("./data/guidelines"),
            collection: "cpic_guidelines".to_string(),
            retrieval_k: 8,
            chunking: ChunkingConfig::default(),
            llm: LlmConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("PHARMAGUARD_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("PHARMAGUARD_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(dir) = std::env::var("PHARMAGUARD_DOCS_DIR") {
            config.docs_dir = PathBuf::from(dir);
        }
        if let Ok(name) = std::env::var("PHARMAGUARD_COLLECTION") {
            config.collection = name;
        }
        if let Ok(val) = std::env::var("PHARMAGUARD_RETRIEVAL_K") {
            if let Ok(v) = val.parse() {
                config.retrieval_k = v;
            }
        }
        if let Ok(val) = std::env::var("PHARMAGUARD_CHUNK_SIZE") {
            if let Ok(v) = val.parse() {
                config.chunking.chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("PHARMAGUARD_CHUNK_OVERLAP") {
            if let Ok(v) = val.parse() {
                config.chunking.chunk_overlap = v;
            }
        }

        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        // GEMINI_API_KEY takes precedence; LLM_API_KEY covers the other providers
        if let Ok(key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("LLM_API_KEY")) {
            config.llm.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                config.llm.temperature = v;
            }
        }

        if let Ok(url) = std::env::var("ANALYSIS_BACKEND_URL") {
            config.backend.base_url = url;
        }
        if let Ok(val) = std::env::var("ANALYSIS_BACKEND_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.backend.timeout_secs = v;
            }
        }

        config
    }

    pub fn vector_dir(&self) -> PathBuf {
        self.data_dir.join("vectors")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_guideline_pipeline() {
        let config = Config::default();
        assert_eq!(config.collection, "cpic_guidelines");
        assert_eq!(config.retrieval_k, 8);
        assert_eq!(config.chunking.chunk_size, 1500);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.backend.timeout_secs, 30);
    }

    #[test]
    fn test_analyze_url_trims_trailing_slash() {
        let backend = BackendConfig {
            base_url: "http://backend:8000/".to_string(),
            timeout_secs: 5,
        };
        assert_eq!(backend.analyze_url(), "http://backend:8000/api/analyze");
    }
}
