//! Shared HTTP client and configuration for the Data API.

use std::time::Duration;

use reqwest::Client;
use tracing::info;

use vidmatch_core::{defaults, Error, Result, RetryPolicy};

/// Configuration for the Data API client.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Base URL for the API (without trailing `/search`).
    pub base_url: String,
    /// API key used for candidate searches.
    pub api_key: Option<String>,
    /// Appended to every search query; empty disables it.
    pub qualifier: String,
    /// `videoDuration` filter.
    pub video_duration: String,
    /// `videoDefinition` filter.
    pub video_definition: String,
    /// Maximum candidates per search.
    pub max_results: u32,
    /// Playlist holding the user's liked videos.
    pub liked_playlist_id: String,
    /// Maximum liked videos fetched.
    pub liked_max_results: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Retry policy for candidate searches.
    pub retry: RetryPolicy,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::YOUTUBE_API_URL.to_string(),
            api_key: None,
            qualifier: defaults::SEARCH_QUALIFIER.to_string(),
            video_duration: defaults::SEARCH_VIDEO_DURATION.to_string(),
            video_definition: defaults::SEARCH_VIDEO_DEFINITION.to_string(),
            max_results: defaults::SEARCH_MAX_RESULTS,
            liked_playlist_id: defaults::LIKED_PLAYLIST_ID.to_string(),
            liked_max_results: defaults::LIKED_MAX_RESULTS,
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Data API client implementing both video source traits.
#[derive(Clone)]
pub struct YouTubeClient {
    pub(crate) client: Client,
    pub(crate) config: YouTubeConfig,
}

impl YouTubeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: YouTubeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing video API client: url={}, max_results={}, attempts={}",
            config.base_url, config.max_results, config.retry.max_attempts
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = YouTubeConfig {
            base_url: std::env::var("YOUTUBE_API_URL")
                .unwrap_or_else(|_| defaults::YOUTUBE_API_URL.to_string()),
            api_key: std::env::var("YOUTUBE_API_KEY").ok(),
            ..Default::default()
        };

        Self::new(config)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &YouTubeConfig {
        &self.config
    }

    pub(crate) fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), resource)
    }
}
