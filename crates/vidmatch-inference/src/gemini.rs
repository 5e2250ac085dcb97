//! Gemini `embedContent` backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use vidmatch_core::{defaults, Embedding, EmbeddingBackend, Error, Result};

/// Default embedding service endpoint.
pub const DEFAULT_GEMINI_URL: &str = defaults::EMBED_API_URL;

/// Default embedding model.
pub const DEFAULT_EMBED_MODEL: &str = defaults::EMBED_MODEL;

/// Default task type.
pub const DEFAULT_TASK_TYPE: &str = defaults::EMBED_TASK_TYPE;

/// Timeout for embedding requests (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = defaults::EMBED_TIMEOUT_SECS;

/// Configuration for the Gemini embedding backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key passed as the `key` query parameter.
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub model: String,
    /// Task type hint sent with each request.
    pub task_type: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_key: None,
            model: DEFAULT_EMBED_MODEL.to_string(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Embedding backend for the Gemini `embedContent` endpoint.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Gemini embedding backend: url={}, model={}",
            config.base_url, config.model
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = GeminiConfig {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string()),
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            model: std::env::var("GEMINI_EMBED_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.to_string()),
            task_type: std::env::var("GEMINI_TASK_TYPE")
                .unwrap_or_else(|_| DEFAULT_TASK_TYPE.to_string()),
            timeout_seconds: std::env::var("GEMINI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/models/{}:embedContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    task_type: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    #[serde(default)]
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Option<Vec<f64>>,
}

#[async_trait]
impl EmbeddingBackend for GeminiBackend {
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "gemini", op = "embed_text", model = %self.config.model, input_len = text.len()))]
    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        let start = Instant::now();

        let request = EmbedContentRequest {
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: &self.config.task_type,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(ref key) = self.config.api_key {
            builder = builder.query(&[("key", key)]);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Embedding(format!(
                "Embedding API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let result: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        let values = result
            .embedding
            .and_then(|e| e.values)
            .ok_or_else(|| Error::Embedding("Response missing embedding.values".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            dimension = values.len(),
            duration_ms = elapsed,
            "Embedding complete"
        );
        if elapsed > 5000 {
            warn!(duration_ms = elapsed, slow = true, "Slow embedding operation");
        }
        Ok(values)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, "https://generativelanguage.googleapis.com");
        assert_eq!(config.model, "embedding-001");
        assert_eq!(config.task_type, "RETRIEVAL_DOCUMENT");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new(GeminiConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "http://localhost:8080/v1/models/embedding-001:embedContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = EmbedContentRequest {
            content: Content {
                parts: vec![Part { text: "hello" }],
            },
            task_type: "RETRIEVAL_DOCUMENT",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "content": { "parts": [{ "text": "hello" }] },
                "taskType": "RETRIEVAL_DOCUMENT"
            })
        );
    }

    #[test]
    fn test_model_name() {
        let backend = GeminiBackend::new(GeminiConfig {
            model: "text-embedding-004".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.model_name(), "text-embedding-004");
    }
}
