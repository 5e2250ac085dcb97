//! # vidmatch-api
//!
//! Recommendation orchestrator and HTTP surface for vidmatch.
//!
//! This crate provides:
//! - [`services::Recommender`]: search → embed → rank, with the anonymous
//!   fallback when no token is cached
//! - [`auth`]: token cache, interactive acquisition and revocation
//! - [`config`]: TOML and environment configuration
//! - [`handlers`]: the axum router exposing `recommend` and auth endpoints

pub mod auth;
pub mod config;
pub mod handlers;
pub mod services;

pub use auth::{Authorizer, CachedTokenProvider, EnvAuthorizer, TokenCache, TokenRevoker};
pub use config::{AppConfig, ConfigError};
pub use handlers::{router, AppState};
pub use services::{RecommendConfig, Recommender};
