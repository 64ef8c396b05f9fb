//! Mock embedding backend for deterministic testing.
//!
//! Generates stable vectors per input text so similarity outcomes are
//! reproducible, with optional pinned vectors, simulated latency, and
//! failure injection.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use skillmap_resolve::mock::MockEmbeddingBackend;
//!
//! let backend = MockEmbeddingBackend::new(4)
//!     .with_vector("pytorch", vec![0.95, 0.05, 0.0, 0.0]);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use skillmap_core::{EmbeddingBackend, Error, Result, Vector};

/// One recorded backend invocation, for test assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub texts: Vec<String>,
    pub timestamp: std::time::Instant,
}

#[derive(Clone)]
struct MockConfig {
    dimension: usize,
    pinned: HashMap<String, Vec<f32>>,
    latency: Duration,
    fail: bool,
}

/// Mock embedding backend with a call log.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockEmbeddingBackend {
    pub fn new(dimension: usize) -> Self {
        Self {
            config: Arc::new(MockConfig {
                dimension,
                pinned: HashMap::new(),
                latency: Duration::ZERO,
                fail: false,
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pin an exact vector for a given input text. Non-pinned texts fall
    /// back to deterministic character hashing.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.config)
            .pinned
            .insert(text.into(), vector);
        self
    }

    /// Simulate latency on every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.config).latency = latency;
        self
    }

    /// Make every call fail.
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// All logged calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of backend invocations so far.
    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }

    /// Deterministic unit vector derived from text content. The same text
    /// always produces the same vector.
    fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vec.iter_mut() {
                *x /= norm;
            }
        }
        vec
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.call_log.lock().unwrap().push(MockCall {
            texts: texts.to_vec(),
            timestamp: std::time::Instant::now(),
        });

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
        if self.config.fail {
            return Err(Error::Embedding("simulated backend failure".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                let raw = self
                    .config
                    .pinned
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| Self::generate(text, self.config.dimension));
                Vector::from(raw)
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let backend = MockEmbeddingBackend::new(8);
        let a = backend.embed_texts(&["rust".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["rust".to_string()]).await.unwrap();
        assert_eq!(a[0].as_slice(), b[0].as_slice());
        assert_eq!(backend.embed_call_count(), 2);
    }

    #[tokio::test]
    async fn test_pinned_vector_wins() {
        let backend =
            MockEmbeddingBackend::new(2).with_vector("js", vec![1.0, 0.0]);
        let out = backend.embed_texts(&["js".to_string()]).await.unwrap();
        assert_eq!(out[0].as_slice(), &[1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MockEmbeddingBackend::new(2).with_failure();
        let err = backend.embed_texts(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(backend.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_batch_order_preserved() {
        let backend = MockEmbeddingBackend::new(4)
            .with_vector("a", vec![1.0, 0.0, 0.0, 0.0])
            .with_vector("b", vec![0.0, 1.0, 0.0, 0.0]);
        let out = backend
            .embed_texts(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(out[0].as_slice()[0], 1.0);
        assert_eq!(out[1].as_slice()[1], 1.0);
    }
}
