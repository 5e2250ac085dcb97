//! # vidmatch-youtube
//!
//! Client for the video platform Data API.
//!
//! This crate provides:
//! - Candidate search with bounded retry and exponential backoff
//!   ([`VideoSearch`])
//! - Liked-playlist retrieval with a bearer token ([`LikedVideoSource`])
//!
//! ## Example
//!
//! ```ignore
//! use vidmatch_youtube::{YouTubeClient, YouTubeConfig};
//! use vidmatch_core::VideoSearch;
//!
//! let client = YouTubeClient::new(YouTubeConfig {
//!     api_key: Some("...".to_string()),
//!     ..Default::default()
//! })?;
//! let candidates = client.search_candidates("python tutorials").await?;
//! ```

pub mod client;
pub mod playlist;
pub mod search;

// Re-export core types
pub use vidmatch_core::*;

pub use client::{YouTubeClient, YouTubeConfig};
