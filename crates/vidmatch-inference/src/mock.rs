//! Mock embedding backend for deterministic testing.
//!
//! Generates deterministic embeddings from the input text, with optional
//! fixed mappings, per-text failures and simulated latency.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vidmatch_inference::mock::MockEmbeddingBackend;
//!
//! let backend = MockEmbeddingBackend::new()
//!     .with_dimension(8)
//!     .with_embedding("Intro to Python ", vec![1.0, 0.0])
//!     .with_failure_on("unembeddable");
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vidmatch_core::{Embedding, EmbeddingBackend, Error, Result};

/// Mock embedding backend for testing.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    mappings: HashMap<String, Embedding>,
    failures: HashSet<String>,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 8,
            mappings: HashMap::new(),
            failures: HashSet::new(),
            latency_ms: 0,
        }
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the dimension of generated embeddings.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Return a fixed embedding for an exact input text.
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Embedding) -> Self {
        Arc::make_mut(&mut self.config)
            .mappings
            .insert(text.into(), embedding);
        self
    }

    /// Fail every request for an exact input text.
    pub fn with_failure_on(mut self, text: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failures.insert(text.into());
        self
    }

    /// Set simulated latency for each request.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Texts received so far, in call order.
    pub fn get_calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn embed_call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Highest number of requests observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn deterministic_embedding(&self, text: &str) -> Embedding {
        (0..self.config.dimension)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                i.hash(&mut hasher);
                (hasher.finish() % 2000) as f64 / 1000.0 - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_text(&self, text: &str) -> Result<Embedding> {
        self.call_log.lock().unwrap().push(text.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.config.failures.contains(text) {
            return Err(Error::Embedding(format!("mock failure for '{}'", text)));
        }

        Ok(self
            .config
            .mappings
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.deterministic_embedding(text)))
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}
