//! Seam traits for the remote services the recommendation pipeline consumes.
//!
//! Every network collaborator sits behind one of these traits so the
//! orchestrator can be exercised against in-memory doubles.

use async_trait::async_trait;

use crate::{Embedding, Result, VideoItem, VideoSummary};

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for turning text into an embedding vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate the embedding for a single text.
    ///
    /// The whole text is sent; callers decide how to key any cache.
    async fn embed_text(&self, text: &str) -> Result<Embedding>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// VIDEO SOURCE TRAITS
// =============================================================================

/// Provider of candidate videos for a query.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Search for candidate videos, already normalized.
    ///
    /// Fails with [`crate::Error::SearchFailure`] once retries are exhausted.
    async fn search_candidates(&self, query: &str) -> Result<Vec<VideoSummary>>;
}

/// Provider of the signed-in user's liked videos.
#[async_trait]
pub trait LikedVideoSource: Send + Sync {
    /// Fetch the raw liked-playlist items using a bearer token.
    ///
    /// Fails with [`crate::Error::AuthExpired`] on HTTP 401 and
    /// [`crate::Error::FetchFailure`] on any other non-success status.
    async fn fetch_liked(&self, token: &str) -> Result<Vec<VideoItem>>;
}

// =============================================================================
// AUTH TRAITS
// =============================================================================

/// Supplier of the opaque bearer token granting playlist access.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a token. Non-interactive lookups never prompt and return `Ok(None)`
    /// when no token is available; interactive lookups may acquire a new one.
    async fn token(&self, interactive: bool) -> Result<Option<String>>;

    /// Drop a token that the remote API rejected, forcing the next
    /// acquisition to go through the interactive path.
    async fn invalidate(&self, token: &str);
}
