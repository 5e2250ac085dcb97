//! Recommendation orchestration.
//!
//! Sequences candidate search, batch embedding and ranking, choosing between
//! the anonymous fallback and the personalized path depending on whether a
//! token is available without prompting.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn, Span};

use vidmatch_core::{
    defaults, logging, EmbeddedVideo, Error, LikedVideoSource, RankedVideo, Result, TokenProvider,
    VideoSearch, VideoSummary,
};
use vidmatch_inference::{embed_all, EmbeddingClient};
use vidmatch_search::{find_best_matches, RankingConfig};

/// Tuning for the recommendation flow.
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// Videos embedded concurrently per batch.
    pub batch_size: usize,
    /// Candidates returned unranked when no token is available.
    pub anonymous_limit: usize,
    pub ranking: RankingConfig,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::EMBED_BATCH_SIZE,
            anonymous_limit: defaults::ANONYMOUS_LIMIT,
            ranking: RankingConfig::default(),
        }
    }
}

/// The recommendation orchestrator.
#[derive(Clone)]
pub struct Recommender {
    tokens: Arc<dyn TokenProvider>,
    search: Arc<dyn VideoSearch>,
    liked: Arc<dyn LikedVideoSource>,
    embedder: EmbeddingClient,
    config: RecommendConfig,
}

impl Recommender {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        search: Arc<dyn VideoSearch>,
        liked: Arc<dyn LikedVideoSource>,
        embedder: EmbeddingClient,
    ) -> Self {
        Self {
            tokens,
            search,
            liked,
            embedder,
            config: RecommendConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RecommendConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    pub fn embedder(&self) -> &EmbeddingClient {
        &self.embedder
    }

    /// Recommend videos for `query`.
    ///
    /// Without a token the first `anonymous_limit` embedded candidates are
    /// returned unranked. With one, candidates are ranked against the user's
    /// liked videos. A rejected token is invalidated before
    /// [`Error::AuthExpired`] is returned.
    #[instrument(skip(self), fields(subsystem = "api", component = "recommender", op = "recommend", personalized = tracing::field::Empty, result_count = tracing::field::Empty))]
    pub async fn recommend(&self, query: &str) -> Result<Vec<RankedVideo>> {
        let start = Instant::now();

        let token = match self.tokens.token(false).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Token lookup failed, continuing without token");
                None
            }
        };

        let candidates = self.search.search_candidates(query).await?;
        let embedded = embed_all(&self.embedder, candidates, self.config.batch_size).await;

        let span = Span::current();
        span.record(logging::PERSONALIZED, token.is_some());

        let Some(token) = token else {
            let results: Vec<RankedVideo> = embedded
                .into_iter()
                .take(self.config.anonymous_limit)
                .map(RankedVideo::unranked)
                .collect();
            span.record(logging::RESULT_COUNT, results.len());
            info!(
                result_count = results.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Anonymous recommendations returned"
            );
            return Ok(results);
        };

        let liked = self.embedded_liked(&token).await?;
        let results = find_best_matches(&liked, &embedded, &self.config.ranking);
        span.record(logging::RESULT_COUNT, results.len());

        let stats = self.embedder.cache().stats();
        info!(
            result_count = results.len(),
            liked_count = liked.len(),
            candidate_count = embedded.len(),
            cache_size = self.embedder.cache().len(),
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            duration_ms = start.elapsed().as_millis() as u64,
            "Personalized recommendations returned"
        );
        Ok(results)
    }

    /// Fetch, normalize and embed the user's liked videos.
    async fn embedded_liked(&self, token: &str) -> Result<Vec<EmbeddedVideo>> {
        let items = match self.liked.fetch_liked(token).await {
            Ok(items) => items,
            Err(Error::AuthExpired) => {
                self.tokens.invalidate(token).await;
                return Err(Error::AuthExpired);
            }
            Err(e) => return Err(e),
        };

        let fetched = items.len();
        let videos: Vec<VideoSummary> = items.iter().filter_map(VideoSummary::from_item).collect();
        if videos.len() < fetched {
            debug!(
                dropped_count = fetched - videos.len(),
                "Skipped liked items without a video id or snippet"
            );
        }

        Ok(embed_all(&self.embedder, videos, self.config.batch_size).await)
    }
}
