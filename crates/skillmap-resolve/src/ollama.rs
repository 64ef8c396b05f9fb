//! Ollama embedding backend.
//!
//! Talks to a local or remote Ollama server over its `/api/embed` endpoint.
//! This is the production [`EmbeddingBackend`]; tests use
//! [`crate::mock::MockEmbeddingBackend`] instead.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use skillmap_core::{defaults, EmbeddingBackend, Error, Result, Vector};

/// Default Ollama server URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding backend backed by an Ollama server.
#[derive(Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
    timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new() -> Self {
        Self::with_config(
            DEFAULT_OLLAMA_URL.to_string(),
            defaults::EMBED_MODEL.to_string(),
            defaults::EMBED_DIMENSION,
        )
    }

    pub fn with_config(base_url: String, model: String, dimension: usize) -> Self {
        let timeout_secs = std::env::var("SKILLMAP_EMBED_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_TIMEOUT_SECS);

        info!(
            base_url = %base_url,
            model = %model,
            dimension,
            "Initializing Ollama embedding backend"
        );

        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
            dimension,
            timeout_secs,
        }
    }

    /// Build from environment variables:
    /// - `OLLAMA_BASE`
    /// - `OLLAMA_EMBED_MODEL`
    /// - `OLLAMA_EMBED_DIM`
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model = std::env::var("OLLAMA_EMBED_MODEL")
            .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string());
        let dimension = std::env::var("OLLAMA_EMBED_DIM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::EMBED_DIMENSION);
        Self::with_config(base_url, model, dimension)
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaBackend {
    #[instrument(skip(self, texts), fields(subsystem = "resolve", component = "ollama", op = "embed_texts", model = %self.model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();

        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.embeddings.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "Expected {} vectors, got {}",
                texts.len(),
                result.embeddings.len()
            )));
        }

        let vectors: Vec<Vector> = result.embeddings.into_iter().map(Vector::from).collect();
        let elapsed = start.elapsed().as_millis() as u64;

        debug!(
            result_count = vectors.len(),
            duration_ms = elapsed,
            "Embedding complete"
        );
        if elapsed > 5000 {
            warn!(
                duration_ms = elapsed,
                input_count = texts.len(),
                slow = true,
                "Slow embedding operation"
            );
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let backend = OllamaBackend::new();
        assert_eq!(backend.dimension(), defaults::EMBED_DIMENSION);
        assert_eq!(backend.model_name(), defaults::EMBED_MODEL);
    }

    #[tokio::test]
    async fn test_empty_input_skips_http() {
        let backend = OllamaBackend::with_config(
            "http://127.0.0.1:1".to_string(),
            "test".to_string(),
            4,
        );
        let out = backend.embed_texts(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
