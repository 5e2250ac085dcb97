//! Centralized default constants for vidmatch.
//!
//! **This module is the single source of truth** for all shared default values.
//! Crates and the configuration layer reference these constants instead of
//! defining their own magic numbers.

// =============================================================================
// SEARCH
// =============================================================================

/// Video platform Data API base URL.
pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Qualifier appended to every candidate search query.
pub const SEARCH_QUALIFIER: &str = "education";

/// `videoDuration` filter for candidate searches.
pub const SEARCH_VIDEO_DURATION: &str = "long";

/// `videoDefinition` filter for candidate searches.
pub const SEARCH_VIDEO_DEFINITION: &str = "high";

/// Maximum candidate videos requested per search.
pub const SEARCH_MAX_RESULTS: u32 = 50;

/// Total search attempts before giving up.
pub const SEARCH_MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay; attempt `n` (0-indexed) waits `base * 2^n`.
pub const SEARCH_BASE_DELAY_MS: u64 = 1000;

/// Playlist id of the signed-in user's liked videos.
pub const LIKED_PLAYLIST_ID: &str = "LL";

/// Maximum liked videos fetched.
pub const LIKED_MAX_RESULTS: u32 = 50;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Remote embedding service base URL.
pub const EMBED_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "embedding-001";

/// Task type sent with every embedding request.
pub const EMBED_TASK_TYPE: &str = "RETRIEVAL_DOCUMENT";

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Maximum number of cached embeddings.
pub const EMBED_CACHE_CAPACITY: usize = 1000;

/// Number of leading characters of the input text used as the cache key.
pub const EMBED_CACHE_KEY_CHARS: usize = 100;

/// Videos embedded concurrently per batch.
pub const EMBED_BATCH_SIZE: usize = 5;

// =============================================================================
// RANKING
// =============================================================================

/// Maximum ranked recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Minimum best-match similarity for a candidate to be kept.
pub const MIN_SIMILARITY: f64 = 0.5;

/// Candidates returned unranked when no user token is available.
pub const ANONYMOUS_LIMIT: usize = 5;

// =============================================================================
// AUTH
// =============================================================================

/// Lifetime assumed for a freshly acquired bearer token (seconds).
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Tokens are treated as expired this long before their real expiry (seconds).
pub const TOKEN_EXPIRY_BUFFER_SECS: i64 = 300;

/// OAuth token revocation endpoint.
pub const TOKEN_REVOKE_URL: &str = "https://accounts.google.com/o/oauth2/revoke";

/// Environment variable consulted for interactive token acquisition.
pub const ENV_OAUTH_TOKEN: &str = "YOUTUBE_OAUTH_TOKEN";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP port.
pub const SERVER_PORT: u16 = 3000;

/// Timeout for search and playlist requests (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;
