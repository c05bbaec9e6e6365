//! # Gateway HTTP Server
//!
//! - `GET /health` - Health check
//! - `PUT /priorities` - Sanitize a priority batch and forward it upstream
//!
//! The upstream key comes from the request's `x-api-key` header, else from
//! `MENURANK_GATEWAY_UPSTREAM_KEY`; with neither the request is refused.

use crate::allowlist::{self, FieldViolation};
use crate::config::GatewayConfig;
use crate::forward::{Forwarder, UpstreamRequest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use menurank_core::MenuRankError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Inbound header carrying the upstream key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Largest accepted batch body (2 MiB).
const BODY_LIMIT: usize = 2 * 1024 * 1024;

// =============================================================================
// STATE & RESPONSES
// =============================================================================

#[derive(Clone)]
pub struct GatewayState {
    pub forwarder: Arc<Forwarder>,
    pub upstream_key: Option<String>,
}

impl GatewayState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, MenuRankError> {
        Ok(Self {
            forwarder: Arc::new(Forwarder::new(config)?),
            upstream_key: config.upstream_key.clone(),
        })
    }
}

/// Result of `PUT /priorities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReport {
    /// Products sent upstream (or that would be, in a dry run).
    pub forwarded: usize,
    pub stripped: Vec<FieldViolation>,
    pub upstream_status: Option<u16>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayErrorBody {
    pub error: String,
}

struct GatewayError(StatusCode, String);

impl From<MenuRankError> for GatewayError {
    fn from(e: MenuRankError) -> Self {
        let status = match &e {
            MenuRankError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MenuRankError::Transport(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self(status, e.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!("{}", self.1);
        }
        (self.0, Json(GatewayErrorBody { error: self.1 })).into_response()
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn request_key(headers: &HeaderMap, fallback: Option<&str>) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or(fallback)
        .map(str::to_owned)
}

async fn priorities_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GatewayReport>, GatewayError> {
    let Some(key) = request_key(&headers, state.upstream_key.as_deref()) else {
        tracing::warn!(
            event = "auth_failure",
            reason = "missing_api_key",
            "No x-api-key and no upstream key configured"
        );
        return Err(GatewayError(StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
    };

    let body: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| MenuRankError::Validation(format!("Body is not JSON: {}", e)))?;
    let sanitized = allowlist::sanitize(body)?;

    let request = UpstreamRequest::from(&sanitized.batch);
    let dry_run = state.forwarder.is_dry_run();

    let upstream_status = if sanitized.batch.is_empty() {
        tracing::info!("Empty batch; nothing to forward");
        None
    } else {
        state.forwarder.forward(&request, &key).await?.status
    };

    Ok(Json(GatewayReport {
        forwarded: request.params.products.len(),
        stripped: sanitized.stripped,
        upstream_status,
        dry_run,
    }))
}

// =============================================================================
// ROUTER
// =============================================================================

fn build_cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = ["http://localhost:3000", "http://127.0.0.1:3000"]
        .into_iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(API_KEY_HEADER),
        ])
}

pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/priorities", put(priorities_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway.
pub async fn run_server(addr: &str, state: GatewayState) -> Result<(), MenuRankError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MenuRankError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("MenuRank gateway listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| MenuRankError::Io(format!("Server error: {}", e)))
}
