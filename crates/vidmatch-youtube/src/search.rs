//! Candidate search against the Data API `search` endpoint.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn, Span};

use vidmatch_core::{logging, Error, Result, VideoItem, VideoSearch, VideoSummary};

use crate::client::YouTubeClient;

/// Searches slower than this are logged as slow.
const SLOW_SEARCH_MS: u64 = 10_000;

/// Failure of a single search attempt; every kind is retried.
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("YouTube API error: {0}")]
    Status(String),

    #[error("Invalid response format from YouTube API")]
    Malformed,

    #[error("{0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<serde_json::Value>,
}

impl YouTubeClient {
    /// Search query actually sent: the user query plus the qualifier.
    pub fn qualified_query(&self, query: &str) -> String {
        if self.config.qualifier.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, self.config.qualifier)
        }
    }

    async fn search_once(&self, query: &str) -> std::result::Result<Vec<VideoSummary>, AttemptError> {
        let max_results = self.config.max_results.to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("q", query),
            ("type", "video"),
            ("videoDuration", self.config.video_duration.as_str()),
            ("videoDefinition", self.config.video_definition.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(ref key) = self.config.api_key {
            params.push(("key", key.as_str()));
        }

        let response = self
            .client
            .get(self.endpoint("search"))
            .query(&params)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AttemptError::Status(
                status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            ));
        }

        let body: SearchResponse = response.json().await.map_err(|_| AttemptError::Malformed)?;
        let items: Vec<VideoItem> = match body.items {
            Some(value @ serde_json::Value::Array(_)) => {
                serde_json::from_value(value).map_err(|_| AttemptError::Malformed)?
            }
            _ => return Err(AttemptError::Malformed),
        };

        items
            .iter()
            .map(|item| VideoSummary::from_item(item).ok_or(AttemptError::Malformed))
            .collect()
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    #[instrument(skip(self), fields(subsystem = "youtube", component = "search", op = "search_candidates", duration_ms = tracing::field::Empty))]
    async fn search_candidates(&self, query: &str) -> Result<Vec<VideoSummary>> {
        let start = Instant::now();
        let qualified = self.qualified_query(query);

        let result = self
            .config
            .retry
            .run(|attempt| {
                debug!(attempt, q = %qualified, "Searching candidates");
                self.search_once(&qualified)
            })
            .await;

        let elapsed = start.elapsed().as_millis() as u64;
        Span::current().record(logging::DURATION_MS, elapsed);
        if elapsed > SLOW_SEARCH_MS {
            warn!(duration_ms = elapsed, slow = true, "Slow candidate search");
        }

        match result {
            Ok(videos) => {
                info!(
                    result_count = videos.len(),
                    duration_ms = elapsed,
                    "Candidate search complete"
                );
                Ok(videos)
            }
            Err((attempts, last)) => Err(Error::SearchFailure {
                attempts,
                message: last.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::YouTubeConfig;

    #[test]
    fn test_qualified_query_appends_qualifier() {
        let client = YouTubeClient::new(YouTubeConfig::default()).unwrap();
        assert_eq!(client.qualified_query("python tutorials"), "python tutorials education");
    }

    #[test]
    fn test_empty_qualifier_leaves_query_untouched() {
        let client = YouTubeClient::new(YouTubeConfig {
            qualifier: String::new(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.qualified_query("rust"), "rust");
    }

    #[test]
    fn test_attempt_error_messages() {
        assert_eq!(
            AttemptError::Status("Forbidden".to_string()).to_string(),
            "YouTube API error: Forbidden"
        );
        assert_eq!(
            AttemptError::Malformed.to_string(),
            "Invalid response format from YouTube API"
        );
    }
}
