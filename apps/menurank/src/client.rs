//! # HTTP Clients
//!
//! Outbound calls made by the server:
//! - [`SourceClient`] fetches the export document from the shop
//! - [`GatewayClient`] publishes priority updates through the gateway
//!
//! Failures never touch the session; callers map them to
//! `MenuRankError::Transport`.

use crate::config::{GatewayConfig, SourceConfig};
use menurank_core::{MenuRankError, PriorityUpdateBatch};
use serde_json::Value;
use std::time::Duration;

/// Header carrying the shop / gateway key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// The HTTP client could not be built.
    Setup(String),
    /// Cannot reach the remote end (includes timeouts).
    ConnectionFailed(String),
    /// 401 Unauthorized - invalid or missing API key.
    Unauthorized,
    /// 429 Too Many Requests.
    RateLimited,
    /// Remote returned a non-success status.
    Status(u16, String),
    /// Failed to read or parse the response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup(msg) => write!(f, "HTTP client setup failed: {msg}"),
            Self::ConnectionFailed(msg) => write!(f, "Cannot connect to {msg}"),
            Self::Unauthorized => write!(f, "Unauthorized: invalid or missing API key"),
            Self::RateLimited => write!(f, "Rate limited: too many requests"),
            Self::Status(status, msg) => write!(f, "Remote error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for MenuRankError {
    fn from(e: ClientError) -> Self {
        MenuRankError::Transport(e.to_string())
    }
}

fn build_http(timeout_secs: u64) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ClientError::Setup(e.to_string()))
}

/// Map error statuses; pass successful responses through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::RateLimited);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Status(status.as_u16(), body));
    }
    Ok(resp)
}

// =============================================================================
// SOURCE
// =============================================================================

/// Fetches the export document over HTTP.
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl SourceClient {
    pub fn new(url: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            url,
            api_key,
        })
    }

    /// Client for the configured source, if a URL is set.
    pub fn from_config(config: &SourceConfig) -> Result<Option<Self>, ClientError> {
        config
            .url
            .clone()
            .map(|url| Self::new(url, config.api_key.clone(), config.timeout_secs))
            .transpose()
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client for another URL sharing this connection pool. The API key is
    /// kept only when `url` is this client's own URL.
    #[must_use]
    pub fn for_url(&self, url: String) -> Self {
        let api_key = if url == self.url {
            self.api_key.clone()
        } else {
            None
        };
        Self {
            http: self.http.clone(),
            url,
            api_key,
        }
    }

    /// GET the document text from the client's URL.
    pub async fn fetch(&self) -> Result<String, ClientError> {
        let url = &self.url;
        let mut req = self.http.get(url);
        if let Some(ref key) = self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        tracing::info!("Fetching export document from {}", url);
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{url}: {e}")))?;
        check_status(resp)
            .await?
            .text()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

/// Sends priority batches to the gateway's `PUT /priorities`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        Ok(Self {
            http: build_http(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Client for the configured gateway, if a URL is set.
    pub fn from_config(config: &GatewayConfig) -> Result<Option<Self>, ClientError> {
        config
            .url
            .clone()
            .map(|url| Self::new(url, config.api_key.clone(), config.timeout_secs))
            .transpose()
    }

    /// PUT /priorities → gateway report.
    pub async fn publish(&self, batch: &PriorityUpdateBatch) -> Result<Value, ClientError> {
        let url = format!("{}/priorities", self.base_url);
        let mut req = self.http.put(&url).json(batch);
        if let Some(ref key) = self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        tracing::info!(
            entries = batch.updates.len(),
            assignments = batch.assignment_count(),
            "Publishing priority updates"
        );
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))?;
        check_status(resp)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
