//! Service layer for business logic.

pub mod recommendation_service;

pub use recommendation_service::{RecommendConfig, Recommender};
