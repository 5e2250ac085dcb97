//! Video data model shared by every vidmatch crate.
//!
//! Three stages of the same record flow through the pipeline:
//! [`VideoSummary`] (normalized provider item) → [`EmbeddedVideo`] (summary plus
//! embedding) → [`RankedVideo`] (embedded video plus its best match). None of
//! them is mutated after construction.

use serde::{Deserialize, Serialize};

/// Embedding vector as returned by the remote embedding service.
pub type Embedding = Vec<f64>;

// =============================================================================
// NORMALIZED VIDEOS
// =============================================================================

/// A video normalized from a search or playlist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `title + " " + description`; the text that gets embedded.
    pub full_text: String,
    pub thumbnail: String,
    pub channel_title: String,
}

impl VideoSummary {
    /// Build a summary, deriving `full_text` from title and description.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        thumbnail: impl Into<String>,
        channel_title: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let description = description.into();
        let full_text = format!("{} {}", title, description);
        Self {
            id: id.into(),
            title,
            description,
            full_text,
            thumbnail: thumbnail.into(),
            channel_title: channel_title.into(),
        }
    }

    /// Normalize a raw provider item into a summary.
    ///
    /// Accepts both search results (`id.videoId`) and playlist items
    /// (`snippet.resourceId.videoId`). Returns `None` when the item has no
    /// snippet or no resolvable video id.
    pub fn from_item(item: &VideoItem) -> Option<Self> {
        let snippet = item.snippet.as_ref()?;
        let id = item.video_id()?;

        let thumbnail = snippet
            .thumbnails
            .as_ref()
            .and_then(Thumbnails::best_url)
            .unwrap_or_default();

        Some(Self::new(
            id,
            snippet.title.clone().unwrap_or_default(),
            snippet.description.clone().unwrap_or_default(),
            thumbnail,
            snippet.channel_title.clone().unwrap_or_default(),
        ))
    }
}

/// A video together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedVideo {
    #[serde(flatten)]
    pub video: VideoSummary,
    pub embedding: Embedding,
}

impl EmbeddedVideo {
    pub fn new(video: VideoSummary, embedding: Embedding) -> Self {
        Self { video, embedding }
    }

    /// True when the embedding can take part in a similarity comparison.
    pub fn has_embedding(&self) -> bool {
        !self.embedding.is_empty()
    }
}

/// A recommendation returned to the caller.
///
/// `similarity` and `matched_with` are `None` for unranked results (anonymous
/// fallback, or ranking skipped because one input list was empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedVideo {
    #[serde(flatten)]
    pub video: EmbeddedVideo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_with: Option<String>,
}

impl RankedVideo {
    /// Wrap an embedded video without ranking information.
    pub fn unranked(video: EmbeddedVideo) -> Self {
        Self {
            video,
            similarity: None,
            matched_with: None,
        }
    }

    /// Wrap an embedded video with its best-match score.
    pub fn ranked(video: EmbeddedVideo, similarity: f64, matched_with: Option<String>) -> Self {
        Self {
            video,
            similarity: Some(similarity),
            matched_with,
        }
    }

    pub fn id(&self) -> &str {
        &self.video.video.id
    }

    pub fn title(&self) -> &str {
        &self.video.video.title
    }
}

// =============================================================================
// RAW PROVIDER ITEMS
// =============================================================================

/// Raw item as returned by the search and playlist endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub snippet: Option<Snippet>,
}

impl VideoItem {
    /// Resolve the video id from either item shape.
    pub fn video_id(&self) -> Option<String> {
        let from_id = match &self.id {
            Some(ItemId::Resource(resource)) => resource.video_id.clone(),
            _ => None,
        };
        from_id.or_else(|| {
            self.snippet
                .as_ref()
                .and_then(|s| s.resource_id.as_ref())
                .and_then(|r| r.video_id.clone())
        })
    }
}

/// Search items carry a resource object, playlist items a plain item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Resource(ResourceId),
    Plain(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
    #[serde(default)]
    pub channel_title: Option<String>,
    /// Present on playlist items only.
    #[serde(default)]
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, rename = "default")]
    pub standard: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
}

impl Thumbnails {
    /// High resolution first, then the default thumbnail.
    pub fn best_url(&self) -> Option<String> {
        self.high
            .as_ref()
            .and_then(|t| t.url.clone())
            .or_else(|| self.standard.as_ref().and_then(|t| t.url.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
}
