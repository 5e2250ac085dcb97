use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use vidmatch_api::{
    router, AppConfig, AppState, CachedTokenProvider, EnvAuthorizer, Recommender, TokenRevoker,
};
use vidmatch_inference::{EmbeddingCache, EmbeddingClient, GeminiBackend};
use vidmatch_youtube::YouTubeClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = init_tracing();

    let config = AppConfig::load()?;

    // Video platform client serves both search and liked videos
    let youtube = Arc::new(YouTubeClient::new(config.youtube_config())?);

    let backend = GeminiBackend::new(config.gemini_config())?;
    let cache = Arc::new(EmbeddingCache::new(config.embedding.cache_capacity));
    let embedder = EmbeddingClient::with_cache(Arc::new(backend), cache)
        .with_key_chars(config.embedding.cache_key_chars);

    let mut auth = CachedTokenProvider::new(Arc::new(EnvAuthorizer::new(&config.auth.token_env)))
        .with_lifetime(
            config.auth.token_lifetime_secs,
            config.auth.expiry_buffer_secs,
        );
    if !config.auth.revoke_url.is_empty() {
        auth = auth.with_revoker(TokenRevoker::new(&config.auth.revoke_url)?);
    }
    let auth = Arc::new(auth);

    let recommender = Recommender::new(auth.clone(), youtube.clone(), youtube, embedder)
        .with_config(config.recommend_config());

    let app = router(
        AppState::new(recommender, auth),
        &config.server.allowed_origins,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Install the global subscriber.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - log to this file with daily rotation instead of stdout
///   LOG_ANSI    - "true"/"false"; colors default on for stdout, off for files
///   RUST_LOG    - env filter (default: "vidmatch_api=debug,tower_http=debug")
///
/// The returned guard flushes the file writer and must outlive the server.
fn init_tracing() -> Option<WorkerGuard> {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    let log_file = std::env::var("LOG_FILE").ok();
    let ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(log_file.is_none());

    let (writer, guard) = match log_file.as_deref().map(std::path::Path::new) {
        Some(path) => {
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let name = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("vidmatch-api.log");
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidmatch_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(json, ansi, writer))
        .init();

    info!(
        json,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

fn fmt_layer<S>(json: bool, ansi: bool, writer: BoxMakeWriter) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn emit(json: bool) -> String {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::registry().with(fmt_layer(
            json,
            false,
            BoxMakeWriter::new(move || sink.clone()),
        ));
        tracing::subscriber::with_default(subscriber, || {
            info!(result_count = 3, "Recommendations returned");
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_json_format_emits_json_lines() {
        let output = emit(true);
        let line: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(line["fields"]["message"], "Recommendations returned");
        assert_eq!(line["fields"]["result_count"], 3);
    }

    #[test]
    fn test_text_format_without_ansi() {
        let output = emit(false);
        assert!(output.contains("Recommendations returned"));
        assert!(output.contains("result_count=3"));
        assert!(!output.contains('\u{1b}'));
    }
}
