//! # vidmatch-inference
//!
//! Embedding layer for vidmatch.
//!
//! This crate provides:
//! - Gemini `embedContent` backend implementing [`EmbeddingBackend`]
//! - Bounded FIFO embedding cache keyed by a text prefix
//! - Caching embedding client that reports failures as absence
//! - Batch embedder with bounded per-batch concurrency
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockEmbeddingBackend`] to downstream crates
//! - `integration`: enable tests against the live embedding service
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidmatch_inference::{embed_all, EmbeddingClient, GeminiBackend};
//! use vidmatch_core::VideoSummary;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = GeminiBackend::from_env().unwrap();
//!     let client = EmbeddingClient::new(Arc::new(backend));
//!     let videos = vec![VideoSummary::new("id", "Intro to Python", "", "", "")];
//!     let embedded = embed_all(&client, videos, 5).await;
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod client;
pub mod gemini;

// Mock embedding backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use vidmatch_core::*;

pub use batch::embed_all;
pub use cache::{cache_key, CacheStats, EmbeddingCache};
pub use client::EmbeddingClient;
pub use gemini::{GeminiBackend, GeminiConfig};
