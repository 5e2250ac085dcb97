//! Bearer token management.
//!
//! A single token is cached with an expiry and treated as expired a buffer
//! period early. Interactive lookups go through an [`Authorizer`]; a token
//! rejected by the playlist API is dropped and revoked remotely on a best
//! effort basis, so the next acquisition must be interactive again.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use vidmatch_core::{defaults, Error, Result, TokenProvider};

// =============================================================================
// TOKEN CACHE
// =============================================================================

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// In-memory cache holding at most one token.
#[derive(Debug)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
    expiry_buffer: chrono::Duration,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(defaults::TOKEN_EXPIRY_BUFFER_SECS)
    }
}

impl TokenCache {
    pub fn new(expiry_buffer_secs: i64) -> Self {
        Self {
            slot: Mutex::new(None),
            expiry_buffer: chrono::Duration::seconds(expiry_buffer_secs),
        }
    }

    pub fn expiry_buffer_secs(&self) -> i64 {
        self.expiry_buffer.num_seconds()
    }

    fn lock(&self) -> MutexGuard<'_, Option<CachedToken>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current token if it is still valid at `now`. An expired token is
    /// cleared.
    pub fn get_at(&self, now: DateTime<Utc>) -> Option<String> {
        let mut slot = self.lock();
        let valid = slot
            .as_ref()
            .map(|cached| now < cached.expires_at - self.expiry_buffer)?;
        if valid {
            return slot.as_ref().map(|cached| cached.token.clone());
        }
        debug!("Cached token expired");
        *slot = None;
        None
    }

    pub fn get(&self) -> Option<String> {
        self.get_at(Utc::now())
    }

    /// Store `token`, valid for `lifetime_secs` from `now`.
    pub fn store_at(&self, token: impl Into<String>, lifetime_secs: i64, now: DateTime<Utc>) {
        *self.lock() = Some(CachedToken {
            token: token.into(),
            expires_at: now + chrono::Duration::seconds(lifetime_secs),
        });
    }

    pub fn store(&self, token: impl Into<String>, lifetime_secs: i64) {
        self.store_at(token, lifetime_secs, Utc::now());
    }

    /// Remove and return the cached token, valid or not.
    pub fn clear(&self) -> Option<String> {
        self.lock().take().map(|cached| cached.token)
    }
}

// =============================================================================
// INTERACTIVE ACQUISITION
// =============================================================================

/// Interactive source of new tokens (the sign-in flow).
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<String>;
}

/// Authorizer reading a token from an environment variable.
///
/// Stands in for the browser consent flow when running as a server.
#[derive(Debug, Clone)]
pub struct EnvAuthorizer {
    var: String,
}

impl Default for EnvAuthorizer {
    fn default() -> Self {
        Self::new(defaults::ENV_OAUTH_TOKEN)
    }
}

impl EnvAuthorizer {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl Authorizer for EnvAuthorizer {
    async fn authorize(&self) -> Result<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(Error::Unauthorized(format!(
                "No token available, set {}",
                self.var
            ))),
        }
    }
}

// =============================================================================
// REMOTE REVOCATION
// =============================================================================

/// Client for the token revocation endpoint.
#[derive(Debug, Clone)]
pub struct TokenRevoker {
    client: Client,
    url: String,
}

impl TokenRevoker {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Revoke `token`. Failures are logged and otherwise ignored.
    pub async fn revoke(&self, token: &str) {
        let result = self
            .client
            .get(&self.url)
            .query(&[("token", token)])
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => debug!("Token revoked"),
            Ok(resp) => warn!(status = %resp.status(), "Token revocation rejected"),
            Err(e) => warn!(error = %e, "Token revocation failed"),
        }
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Token provider backed by [`TokenCache`].
pub struct CachedTokenProvider {
    cache: TokenCache,
    authorizer: Arc<dyn Authorizer>,
    revoker: Option<TokenRevoker>,
    lifetime_secs: i64,
}

impl CachedTokenProvider {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            cache: TokenCache::default(),
            authorizer,
            revoker: None,
            lifetime_secs: defaults::TOKEN_LIFETIME_SECS,
        }
    }

    pub fn with_revoker(mut self, revoker: TokenRevoker) -> Self {
        self.revoker = Some(revoker);
        self
    }

    pub fn with_lifetime(mut self, lifetime_secs: i64, expiry_buffer_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self.cache = TokenCache::new(expiry_buffer_secs);
        self
    }

    /// Store a token pushed by the client, valid for `expires_in_secs` or the
    /// configured lifetime.
    ///
    /// An expiry inside the expiry buffer would be stale on arrival and is
    /// rejected as [`Error::InvalidInput`].
    pub fn set_token(&self, token: impl Into<String>, expires_in_secs: Option<i64>) -> Result<()> {
        let buffer = self.cache.expiry_buffer_secs();
        if let Some(secs) = expires_in_secs {
            if secs <= buffer {
                return Err(Error::InvalidInput(format!(
                    "expiresInSecs must be greater than {}",
                    buffer
                )));
            }
        }
        self.cache
            .store(token, expires_in_secs.unwrap_or(self.lifetime_secs));
        info!("Token stored");
        Ok(())
    }

    /// Drop the cached token and revoke it remotely.
    pub async fn sign_out(&self) {
        if let Some(token) = self.cache.clear() {
            self.revoke(&token).await;
        }
        info!("Signed out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.cache.get().is_some()
    }

    async fn revoke(&self, token: &str) {
        if let Some(ref revoker) = self.revoker {
            revoker.revoke(token).await;
        }
    }
}

#[async_trait]
impl TokenProvider for CachedTokenProvider {
    #[instrument(skip(self), fields(subsystem = "auth", component = "token_provider", op = "token"))]
    async fn token(&self, interactive: bool) -> Result<Option<String>> {
        if let Some(token) = self.cache.get() {
            return Ok(Some(token));
        }
        if !interactive {
            debug!("No cached token");
            return Ok(None);
        }

        let token = self.authorizer.authorize().await?;
        self.cache.store(token.clone(), self.lifetime_secs);
        info!("Token acquired interactively");
        Ok(Some(token))
    }

    #[instrument(skip(self, token), fields(subsystem = "auth", component = "token_provider", op = "invalidate"))]
    async fn invalidate(&self, token: &str) {
        self.cache.clear();
        warn!("Token invalidated");
        self.revoke(token).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authorizer handing out numbered tokens.
    #[derive(Default)]
    struct CountingAuthorizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Authorizer for CountingAuthorizer {
        async fn authorize(&self) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{}", n))
        }
    }

    struct DenyingAuthorizer;

    #[async_trait]
    impl Authorizer for DenyingAuthorizer {
        async fn authorize(&self) -> Result<String> {
            Err(Error::Unauthorized("user declined".to_string()))
        }
    }

    #[test]
    fn test_cache_valid_until_buffer() {
        let cache = TokenCache::new(300);
        let now = Utc::now();
        cache.store_at("t", 3600, now);

        assert_eq!(cache.get_at(now).as_deref(), Some("t"));
        assert_eq!(
            cache.get_at(now + chrono::Duration::seconds(3299)).as_deref(),
            Some("t")
        );
    }

    #[test]
    fn test_cache_expires_early_and_clears() {
        let cache = TokenCache::new(300);
        let now = Utc::now();
        cache.store_at("t", 3600, now);

        assert!(cache.get_at(now + chrono::Duration::seconds(3300)).is_none());
        // Cleared on the expired read, even for an earlier clock.
        assert!(cache.get_at(now).is_none());
    }

    #[test]
    fn test_cache_clear_returns_token() {
        let cache = TokenCache::default();
        cache.store("t", 3600);
        assert_eq!(cache.clear().as_deref(), Some("t"));
        assert!(cache.clear().is_none());
    }

    #[tokio::test]
    async fn test_non_interactive_never_authorizes() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let provider = CachedTokenProvider::new(authorizer.clone());

        assert_eq!(provider.token(false).await.unwrap(), None);
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interactive_acquires_and_caches() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let provider = CachedTokenProvider::new(authorizer.clone());

        assert_eq!(provider.token(true).await.unwrap().as_deref(), Some("token-1"));
        assert_eq!(provider.token(false).await.unwrap().as_deref(), Some("token-1"));
        assert_eq!(provider.token(true).await.unwrap().as_deref(), Some("token-1"));
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_interactive_acquisition() {
        let authorizer = Arc::new(CountingAuthorizer::default());
        let provider = CachedTokenProvider::new(authorizer.clone());
        provider.token(true).await.unwrap();

        provider.invalidate("token-1").await;

        assert_eq!(provider.token(false).await.unwrap(), None);
        assert_eq!(provider.token(true).await.unwrap().as_deref(), Some("token-2"));
        assert_eq!(authorizer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authorizer_failure_propagates() {
        let provider = CachedTokenProvider::new(Arc::new(DenyingAuthorizer));
        let err = provider.token(true).await.unwrap_err();
        assert_eq!(err.kind(), "unauthorized");
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn test_set_token_and_sign_out() {
        let provider = CachedTokenProvider::new(Arc::new(DenyingAuthorizer));

        provider.set_token("pushed", None).unwrap();
        assert!(provider.is_authenticated());
        assert_eq!(provider.token(false).await.unwrap().as_deref(), Some("pushed"));

        provider.sign_out().await;
        assert!(!provider.is_authenticated());
    }

    #[tokio::test]
    async fn test_set_token_rejects_expiry_inside_buffer() {
        let provider = CachedTokenProvider::new(Arc::new(DenyingAuthorizer));

        for secs in [-5, 0, 60, defaults::TOKEN_EXPIRY_BUFFER_SECS] {
            let err = provider.set_token("short", Some(secs)).unwrap_err();
            assert_eq!(err.kind(), "invalid_input");
        }
        assert!(!provider.is_authenticated());

        provider
            .set_token("long", Some(defaults::TOKEN_EXPIRY_BUFFER_SECS + 60))
            .unwrap();
        assert!(provider.is_authenticated());
    }

    #[tokio::test]
    async fn test_env_authorizer_missing_var() {
        let authorizer = EnvAuthorizer::new("VIDMATCH_TEST_TOKEN_NEVER_SET");
        assert!(matches!(
            authorizer.authorize().await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_env_authorizer_reads_var() {
        std::env::set_var("VIDMATCH_TEST_TOKEN_SET", " abc ");
        let token = EnvAuthorizer::new("VIDMATCH_TEST_TOKEN_SET").authorize().await;
        std::env::remove_var("VIDMATCH_TEST_TOKEN_SET");
        assert_eq!(token.unwrap(), "abc");
    }
}
