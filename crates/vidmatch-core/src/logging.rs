//! Structured logging schema and field name constants for vidmatch.
//!
//! Names of span fields that are declared `Empty` on `#[instrument]` spans
//! and filled in later through `Span::record`.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (similarity scores) |

// ─── Span fields recorded after entry ─────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned.
pub const RESULT_COUNT: &str = "result_count";

/// Whether a recommendation request was ranked against liked videos.
pub const PERSONALIZED: &str = "personalized";
