//! Caching embedding client.
//!
//! Wraps an [`EmbeddingBackend`] with the FIFO [`EmbeddingCache`] and turns
//! every backend failure into `None`: a missing embedding is absence, never
//! an error.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use vidmatch_core::{defaults, Embedding, EmbeddingBackend};

use crate::cache::{cache_key, EmbeddingCache};

/// Embedding client shared by every pipeline stage.
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Arc<EmbeddingCache>,
    key_chars: usize,
}

impl EmbeddingClient {
    /// Create a client with a fresh cache of the default capacity.
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self::with_cache(backend, Arc::new(EmbeddingCache::default()))
    }

    /// Create a client around an existing cache.
    pub fn with_cache(backend: Arc<dyn EmbeddingBackend>, cache: Arc<EmbeddingCache>) -> Self {
        Self {
            backend,
            cache,
            key_chars: defaults::EMBED_CACHE_KEY_CHARS,
        }
    }

    /// Override the number of leading characters used as cache key.
    pub fn with_key_chars(mut self, key_chars: usize) -> Self {
        self.key_chars = key_chars;
        self
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Embed `text`, consulting the cache first.
    ///
    /// The full text is sent to the backend even though only its prefix keys
    /// the cache. Returns `None` when the backend fails or yields an empty
    /// vector; nothing is cached in that case.
    #[instrument(skip(self, text), fields(subsystem = "inference", component = "embedding_client", op = "embed"))]
    pub async fn embed(&self, text: &str) -> Option<Embedding> {
        let key = cache_key(text, self.key_chars);
        if let Some(hit) = self.cache.get(&key) {
            debug!(cache_hit = true, "Embedding served from cache");
            return Some(hit);
        }

        match self.backend.embed_text(text).await {
            Ok(embedding) if !embedding.is_empty() => {
                self.cache.put(key, embedding.clone());
                debug!(
                    cache_hit = false,
                    cache_size = self.cache.len(),
                    "Embedding cached"
                );
                Some(embedding)
            }
            Ok(_) => {
                warn!(model = %self.backend.model_name(), "Embedding service returned an empty vector");
                None
            }
            Err(e) => {
                warn!(model = %self.backend.model_name(), error = %e, "Error fetching embedding");
                None
            }
        }
    }
}
