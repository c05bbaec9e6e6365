//! # MenuRank HTTP API Module
//!
//! HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Session status
//! - `POST /document` - Load an export document (raw XML body)
//! - `POST /document/fetch` - Fetch the export document from the source URL
//! - `GET /categories` - Categories with entry counts
//! - `POST /ledger/view` - Select a category and view its order
//! - `POST /ledger/reorder` - Submit a new order for a category
//! - `DELETE /ledger/pending` - Discard pending edits
//! - `POST /export` - Patched document as base64 JSON
//! - `GET /export/download` - Patched document as a file download
//! - `POST /publish` - Send pending edits to the gateway
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `MENURANK_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `MENURANK_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `MENURANK_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{get_api_key_from_env, keys_match};
pub use handlers::{ApiError, status_for};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CategoriesResponse, CategoryJson, DiscardResponse, EntryJson, ErrorResponse, ExportResponse,
    FetchRequest, HealthResponse, LoadResponse, PublishResponse, ReorderRequest, ReorderResponse,
    StatusResponse, ViewRequest, ViewResponse,
};

use crate::client::{GatewayClient, SourceClient};
use crate::config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use menurank_core::{
    MenuRankError, Session,
    primitives::{DEFAULT_SHOP_ID, DEFAULT_TREE_ID},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (16 MiB).
pub const BODY_LIMIT: usize = 16 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The editing session for the loaded document.
    pub session: Arc<RwLock<Session>>,
    /// Source for `POST /document/fetch`.
    pub source: Option<SourceClient>,
    /// Target for `POST /publish`.
    pub gateway: Option<GatewayClient>,
    pub shop_id: u32,
    pub tree_id: u32,
}

impl AppState {
    /// State with a session and no remote endpoints.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            source: None,
            gateway: None,
            shop_id: DEFAULT_SHOP_ID,
            tree_id: DEFAULT_TREE_ID,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceClient) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_gateway(mut self, gateway: GatewayClient, shop_id: u32, tree_id: u32) -> Self {
        self.gateway = Some(gateway);
        self.shop_id = shop_id;
        self.tree_id = tree_id;
        self
    }

    /// State wired from configuration.
    pub fn from_config(config: &AppConfig, session: Session) -> Result<Self, MenuRankError> {
        let mut state = Self::new(session);
        state.source = SourceClient::from_config(&config.source)?;
        state.gateway = GatewayClient::from_config(&config.gateway)?;
        state.shop_id = config.gateway.shop_id;
        state.tree_id = config.gateway.tree_id;

        if state.gateway.is_none() {
            tracing::info!("No gateway configured; POST /publish is unavailable");
        }
        Ok(state)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// Build CORS layer from `MENURANK_CORS_ORIGINS`.
///
/// - `*`: all origins
/// - unset or no valid entries: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("MENURANK_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (MENURANK_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in MENURANK_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No MENURANK_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set MENURANK_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/document", post(handlers::load_handler))
        .route("/document/fetch", post(handlers::fetch_handler))
        .route("/categories", get(handlers::categories_handler))
        .route("/ledger/view", post(handlers::view_handler))
        .route("/ledger/reorder", post(handlers::reorder_handler))
        .route("/ledger/pending", delete(handlers::discard_handler))
        .route("/export", post(handlers::export_handler))
        .route("/export/download", get(handlers::download_handler))
        .route("/publish", post(handlers::publish_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), MenuRankError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| MenuRankError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("MenuRank HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| MenuRankError::Io(format!("Server error: {}", e)))
}
