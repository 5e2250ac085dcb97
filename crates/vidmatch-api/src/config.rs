//! Application configuration.
//!
//! Configuration is loaded from a TOML file (path from `VIDMATCH_CONFIG`,
//! default `~/.config/vidmatch/config.toml`) or built from defaults, then
//! individual fields are overridden from the environment.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 3000
//!
//! [youtube]
//! api_key = "${YOUTUBE_API_KEY}"
//! qualifier = "education"
//!
//! [embedding]
//! api_key = "${GEMINI_API_KEY}"
//! batch_size = 5
//!
//! [ranking]
//! max_recommendations = 10
//! min_similarity = 0.5
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use vidmatch_core::{defaults, RetryPolicy};
use vidmatch_inference::GeminiConfig;
use vidmatch_search::RankingConfig;
use vidmatch_youtube::YouTubeConfig;

use crate::services::RecommendConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: String, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS origins allowed to call the API; empty allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::SERVER_PORT,
            allowed_origins: Vec::new(),
        }
    }
}

/// Data API settings (candidate search and liked videos).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub qualifier: String,
    pub video_duration: String,
    pub video_definition: String,
    pub max_results: u32,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub liked_playlist_id: String,
    pub liked_max_results: u32,
    pub timeout_seconds: u64,
}

impl Default for YouTubeSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::YOUTUBE_API_URL.to_string(),
            api_key: None,
            qualifier: defaults::SEARCH_QUALIFIER.to_string(),
            video_duration: defaults::SEARCH_VIDEO_DURATION.to_string(),
            video_definition: defaults::SEARCH_VIDEO_DEFINITION.to_string(),
            max_results: defaults::SEARCH_MAX_RESULTS,
            max_attempts: defaults::SEARCH_MAX_ATTEMPTS,
            base_delay_ms: defaults::SEARCH_BASE_DELAY_MS,
            liked_playlist_id: defaults::LIKED_PLAYLIST_ID.to_string(),
            liked_max_results: defaults::LIKED_MAX_RESULTS,
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub task_type: String,
    pub timeout_seconds: u64,
    pub cache_capacity: usize,
    pub cache_key_chars: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::EMBED_API_URL.to_string(),
            api_key: None,
            model: defaults::EMBED_MODEL.to_string(),
            task_type: defaults::EMBED_TASK_TYPE.to_string(),
            timeout_seconds: defaults::EMBED_TIMEOUT_SECS,
            cache_capacity: defaults::EMBED_CACHE_CAPACITY,
            cache_key_chars: defaults::EMBED_CACHE_KEY_CHARS,
            batch_size: defaults::EMBED_BATCH_SIZE,
        }
    }
}

/// Ranking and fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    pub max_recommendations: usize,
    pub min_similarity: f64,
    /// Candidates returned unranked when no token is available.
    pub anonymous_limit: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            max_recommendations: defaults::MAX_RECOMMENDATIONS,
            min_similarity: defaults::MIN_SIMILARITY,
            anonymous_limit: defaults::ANONYMOUS_LIMIT,
        }
    }
}

/// Token handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Revocation endpoint; empty disables remote revocation.
    pub revoke_url: String,
    pub token_lifetime_secs: i64,
    pub expiry_buffer_secs: i64,
    /// Environment variable read on interactive sign-in.
    pub token_env: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            revoke_url: defaults::TOKEN_REVOKE_URL.to_string(),
            token_lifetime_secs: defaults::TOKEN_LIFETIME_SECS,
            expiry_buffer_secs: defaults::TOKEN_EXPIRY_BUFFER_SECS,
            token_env: defaults::ENV_OAUTH_TOKEN.to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub youtube: YouTubeSettings,
    pub embedding: EmbeddingSettings,
    pub ranking: RankingSettings,
    pub auth: AuthSettings,
}

impl AppConfig {
    /// Get the default config file path.
    ///
    /// Returns: ~/.config/vidmatch/config.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("vidmatch");
        path.push("config.toml");
        path
    }

    /// Load from `VIDMATCH_CONFIG` or the default path, apply environment
    /// overrides and validate.
    pub fn load() -> ConfigResult<Self> {
        let explicit = env::var("VIDMATCH_CONFIG").ok().map(PathBuf::from);

        let mut config = match explicit {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    info!("Loading config from: {}", path.display());
                    Self::from_file(&path)?
                } else {
                    debug!(
                        "Config file not found at {}, using defaults",
                        path.display()
                    );
                    Self::default()
                }
            }
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, substituting `${VAR}` references.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&Self::substitute_env_vars(&content))
    }

    /// Parse configuration from TOML text. Missing sections use defaults.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override fields from the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Override fields from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("VIDMATCH_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("VIDMATCH_PORT") {
            self.server.port = parse_var("VIDMATCH_PORT", &v)?;
        }
        if let Some(v) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("YOUTUBE_API_URL") {
            self.youtube.base_url = v;
        }
        if let Some(v) = lookup("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(v);
        }
        if let Some(v) = lookup("GEMINI_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Some(v) = lookup("GEMINI_EMBED_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = lookup("VIDMATCH_BATCH_SIZE") {
            self.embedding.batch_size = parse_var("VIDMATCH_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("VIDMATCH_MIN_SIMILARITY") {
            self.ranking.min_similarity = parse_var("VIDMATCH_MIN_SIMILARITY", &v)?;
        }
        if let Some(v) = lookup("TOKEN_REVOKE_URL") {
            self.auth.revoke_url = v;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_url("youtube.base_url", &self.youtube.base_url)?;
        validate_url("embedding.base_url", &self.embedding.base_url)?;
        if !self.auth.revoke_url.is_empty() {
            validate_url("auth.revoke_url", &self.auth.revoke_url)?;
        }

        if self.embedding.model.is_empty() {
            return Err(ConfigError::Validation(
                "embedding.model cannot be empty".to_string(),
            ));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Validation(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.embedding.cache_capacity == 0 {
            return Err(ConfigError::Validation(
                "embedding.cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.youtube.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "youtube.max_attempts must be at least 1".to_string(),
            ));
        }
        if !(-1.0..=1.0).contains(&self.ranking.min_similarity) {
            return Err(ConfigError::Validation(format!(
                "ranking.min_similarity must be within [-1, 1], got: {}",
                self.ranking.min_similarity
            )));
        }
        if self.auth.expiry_buffer_secs >= self.auth.token_lifetime_secs {
            return Err(ConfigError::Validation(
                "auth.expiry_buffer_secs must be shorter than auth.token_lifetime_secs"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn youtube_config(&self) -> YouTubeConfig {
        let yt = &self.youtube;
        YouTubeConfig {
            base_url: yt.base_url.clone(),
            api_key: yt.api_key.clone(),
            qualifier: yt.qualifier.clone(),
            video_duration: yt.video_duration.clone(),
            video_definition: yt.video_definition.clone(),
            max_results: yt.max_results,
            liked_playlist_id: yt.liked_playlist_id.clone(),
            liked_max_results: yt.liked_max_results,
            timeout_seconds: yt.timeout_seconds,
            retry: RetryPolicy::new(yt.max_attempts, Duration::from_millis(yt.base_delay_ms)),
        }
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.embedding.base_url.clone(),
            api_key: self.embedding.api_key.clone(),
            model: self.embedding.model.clone(),
            task_type: self.embedding.task_type.clone(),
            timeout_seconds: self.embedding.timeout_seconds,
        }
    }

    pub fn recommend_config(&self) -> RecommendConfig {
        RecommendConfig {
            batch_size: self.embedding.batch_size,
            anonymous_limit: self.ranking.anonymous_limit,
            ranking: RankingConfig {
                max_recommendations: self.ranking.max_recommendations,
                min_similarity: self.ranking.min_similarity,
            },
        }
    }

    /// Replace `${VAR}` references with environment values; unknown
    /// variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        // Pattern is a literal and always compiles.
        let re = match regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return content.to_string(),
        };
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn validate_url(field: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} must start with http:// or https://, got: {}",
            field, url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.youtube.qualifier, "education");
        assert_eq!(config.embedding.batch_size, 5);
        assert_eq!(config.ranking.anonymous_limit, 5);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = AppConfig::parse(
            r#"
            [youtube]
            qualifier = "lecture"
            max_attempts = 5

            [ranking]
            min_similarity = 0.7
            "#,
        )
        .unwrap();

        assert_eq!(config.youtube.qualifier, "lecture");
        assert_eq!(config.youtube.max_attempts, 5);
        assert_eq!(config.youtube.video_duration, "long");
        assert_eq!(config.ranking.min_similarity, 0.7);
        assert_eq!(config.ranking.max_recommendations, 10);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = AppConfig::parse("[server]\nport = \"not a number\"");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_from_file_substitutes_env_vars() {
        env::set_var("VIDMATCH_TEST_SUBST_KEY", "secret-from-env");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[youtube]\napi_key = \"${{VIDMATCH_TEST_SUBST_KEY}}\"\n[embedding]\napi_key = \"${{VIDMATCH_TEST_UNSET_VAR}}\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        env::remove_var("VIDMATCH_TEST_SUBST_KEY");

        assert_eq!(config.youtube.api_key.as_deref(), Some("secret-from-env"));
        assert_eq!(
            config.embedding.api_key.as_deref(),
            Some("${VIDMATCH_TEST_UNSET_VAR}")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[
                ("VIDMATCH_PORT", "8080"),
                ("YOUTUBE_API_KEY", "yt"),
                ("GEMINI_API_KEY", "gm"),
                ("ALLOWED_ORIGINS", "chrome-extension://abc, http://localhost:5173,"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.youtube.api_key.as_deref(), Some("yt"));
        assert_eq!(config.embedding.api_key.as_deref(), Some("gm"));
        assert_eq!(
            config.server.allowed_origins,
            vec!["chrome-extension://abc", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(lookup(&[("VIDMATCH_PORT", "eighty")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.youtube.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.base_url = String::new();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.youtube.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ranking.min_similarity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_revoke_url_disables_revocation() {
        let mut config = AppConfig::default();
        config.auth.revoke_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conversions() {
        let mut config = AppConfig::default();
        config.youtube.max_attempts = 4;
        config.youtube.base_delay_ms = 250;
        config.embedding.batch_size = 3;
        config.ranking.min_similarity = 0.6;

        let yt = config.youtube_config();
        assert_eq!(yt.retry.max_attempts, 4);
        assert_eq!(yt.retry.base_delay, Duration::from_millis(250));

        let rec = config.recommend_config();
        assert_eq!(rec.batch_size, 3);
        assert_eq!(rec.ranking.min_similarity, 0.6);

        assert_eq!(config.gemini_config().model, "embedding-001");
    }
}
