//! # vidmatch-search
//!
//! Similarity ranking of candidate videos against a user's liked videos.
//!
//! This crate provides:
//! - Cosine similarity that degrades to 0 instead of failing
//! - Best-match ranking with threshold filtering and truncation
//!
//! ## Example
//!
//! ```ignore
//! use vidmatch_search::{find_best_matches, RankingConfig};
//!
//! let ranked = find_best_matches(&liked, &candidates, &RankingConfig::default());
//! for video in &ranked {
//!     println!("{} ({:?})", video.title(), video.similarity);
//! }
//! ```

pub mod ranking;
pub mod similarity;

// Re-export core types
pub use vidmatch_core::*;

pub use ranking::{find_best_matches, RankingConfig};
pub use similarity::cosine_similarity;
