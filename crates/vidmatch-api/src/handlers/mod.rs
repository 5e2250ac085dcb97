//! HTTP handlers for vidmatch-api.
//!
//! Every failure is reported as `{ "success": false, "error", "kind" }` so the
//! calling UI can show the message and keep its previous state.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use vidmatch_core::{Error, RankedVideo, TokenProvider};

use crate::auth::CachedTokenProvider;
use crate::services::Recommender;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub auth: Arc<CachedTokenProvider>,
}

impl AppState {
    pub fn new(recommender: Recommender, auth: Arc<CachedTokenProvider>) -> Self {
        Self {
            recommender: Arc::new(recommender),
            auth,
        }
    }
}

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the API router with tracing, request ids and CORS.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/recommend", post(recommend))
        .route("/api/v1/auth/signin", post(sign_in))
        .route("/api/v1/auth/token", put(set_token).delete(sign_out))
        .route("/api/v1/auth/status", get(auth_status))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Core(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "invalid_input"),
            ApiError::Core(err) => {
                let status = match &err {
                    Error::AuthExpired | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    Error::SearchFailure { .. } | Error::FetchFailure(_) | Error::Request(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!(kind = err.kind(), error = %err, "Request failed");
                } else {
                    warn!(kind = err.kind(), error = %err, "Request rejected");
                }
                (status, err.to_string(), err.kind())
            }
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// RECOMMENDATIONS
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub recommendations: Vec<RankedVideo>,
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(req) = payload?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query cannot be empty".to_string()));
    }

    let recommendations = state.recommender.recommend(query).await?;
    Ok(Json(RecommendResponse {
        success: true,
        recommendations,
    }))
}

// =============================================================================
// AUTH
// =============================================================================

/// Token pushed by the UI. `expiresInSecs` must exceed the expiry buffer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTokenRequest {
    pub token: String,
    #[serde(default)]
    pub expires_in_secs: Option<i64>,
}

async fn sign_in(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.auth.token(true).await?;
    info!("User signed in");
    Ok(Json(serde_json::json!({
        "success": true,
        "authenticated": true,
    })))
}

async fn set_token(
    State(state): State<AppState>,
    payload: Result<Json<SetTokenRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let token = req.token.trim();
    if token.is_empty() {
        return Err(ApiError::BadRequest("token cannot be empty".to_string()));
    }

    state.auth.set_token(token, req.expires_in_secs)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "authenticated": state.auth.is_authenticated(),
    })))
}

async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    state.auth.sign_out().await;
    Json(serde_json::json!({ "success": true }))
}

async fn auth_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "authenticated": state.auth.is_authenticated(),
    }))
}
