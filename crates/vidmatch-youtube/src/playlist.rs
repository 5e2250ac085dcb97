//! Liked-videos retrieval from the `playlistItems` endpoint.

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use vidmatch_core::{Error, LikedVideoSource, Result, VideoItem};

use crate::client::YouTubeClient;

#[derive(Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[async_trait]
impl LikedVideoSource for YouTubeClient {
    /// Single attempt, no retry. Items are returned raw; callers normalize.
    #[instrument(skip(self, token), fields(subsystem = "youtube", component = "playlist", op = "fetch_liked", playlist = %self.config.liked_playlist_id))]
    async fn fetch_liked(&self, token: &str) -> Result<Vec<VideoItem>> {
        let max_results = self.config.liked_max_results.to_string();

        let response = self
            .client
            .get(self.endpoint("playlistItems"))
            .query(&[
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("playlistId", self.config.liked_playlist_id.as_str()),
            ])
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Playlist API rejected the bearer token");
            return Err(Error::AuthExpired);
        }
        if !status.is_success() {
            return Err(Error::FetchFailure(
                status.canonical_reason().unwrap_or(status.as_str()).to_string(),
            ));
        }

        let body: PlaylistItemsResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse playlist items: {}", e)))?;

        info!(result_count = body.items.len(), "Liked videos fetched");
        Ok(body.items)
    }
}
