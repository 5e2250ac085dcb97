//! # vidmatch-core
//!
//! Core types, traits, and abstractions for the vidmatch recommendation engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other vidmatch crates depend on:
//! - Video data model and the shared provider-item normalization
//! - Error taxonomy shared by fetchers, embedders and the orchestrator
//! - Seam traits for the remote embedding, search, playlist and token services
//! - Retry policy with an injectable sleeper

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use traits::*;
