//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every handler takes the session lock for the shortest span it can;
//! network calls (fetch, publish) run with no lock held.

use super::{
    AppState,
    types::{
        CategoriesResponse, CategoryJson, DiscardResponse, ErrorResponse, ExportResponse,
        FetchRequest, HealthResponse, LoadResponse, PublishResponse, ReorderRequest,
        ReorderResponse, StatusResponse, ViewRequest, ViewResponse,
    },
};
use crate::client::{ClientError, SourceClient};
use crate::config::DEFAULT_TIMEOUT_SECS;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use menurank_core::{CategoryPath, MenuRankError, primitives::DOWNLOAD_FILENAME};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a core error.
pub fn status_for(err: &MenuRankError) -> StatusCode {
    match err {
        MenuRankError::Structure(_)
        | MenuRankError::InvalidOrder(_)
        | MenuRankError::UnknownEntry(_, _)
        | MenuRankError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
        MenuRankError::NoDocument => StatusCode::CONFLICT,
        MenuRankError::Transport(_) => StatusCode::BAD_GATEWAY,
        MenuRankError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MenuRankError::Config(_) | MenuRankError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Handler error carrying a core error.
#[derive(Debug)]
pub struct ApiError(pub MenuRankError);

impl From<MenuRankError> for ApiError {
    fn from(e: MenuRankError) -> Self {
        Self(e)
    }
}

impl From<ClientError> for ApiError {
    fn from(e: ClientError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get session status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let document = session.document().ok();

    let response = StatusResponse {
        loaded: document.is_some(),
        entries: document.map_or(0, |d| d.entries().len()),
        categories: document.map_or(0, |d| d.categories().len()),
        pending_edits: session.pending_edits().len(),
        active_category: session.active_category().map(ToString::to_string),
        generated: document.and_then(|d| d.generated()).map(str::to_owned),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// LOAD HANDLERS
// =============================================================================

/// Load a document from the request body.
pub async fn load_handler(State(state): State<AppState>, body: String) -> ApiResult<LoadResponse> {
    let mut session = state.session.write().await;
    let summary = session.load(body)?;
    Ok(Json(summary.into()))
}

/// Fetch the document from the configured (or given) source URL and load it.
pub async fn fetch_handler(State(state): State<AppState>, body: String) -> ApiResult<LoadResponse> {
    let request: FetchRequest = if body.trim().is_empty() {
        FetchRequest::default()
    } else {
        serde_json::from_str(&body)
            .map_err(|e| MenuRankError::Validation(format!("Invalid fetch request: {}", e)))?
    };

    // The configured source key only travels to the configured URL.
    let client = match (&state.source, request.url) {
        (Some(source), Some(url)) => source.for_url(url),
        (Some(source), None) => source.clone(),
        (None, Some(url)) => SourceClient::new(url, None, DEFAULT_TIMEOUT_SECS)?,
        (None, None) => {
            return Err(MenuRankError::Config("No source URL configured".to_string()).into());
        }
    };
    let raw = client.fetch().await?;

    let mut session = state.session.write().await;
    let summary = session.load(raw)?;
    Ok(Json(summary.into()))
}

// =============================================================================
// CATEGORY & LEDGER HANDLERS
// =============================================================================

/// List categories with entry counts.
pub async fn categories_handler(State(state): State<AppState>) -> ApiResult<CategoriesResponse> {
    let session = state.session.read().await;
    let document = session.document()?;

    let categories = document
        .categories()
        .iter()
        .map(|c| CategoryJson {
            path: c.to_string(),
            depth: c.depth(),
            entries: document.count_in(c),
        })
        .collect();

    Ok(Json(CategoriesResponse { categories }))
}

/// Select a category and return its ordered view.
pub async fn view_handler(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> ApiResult<ViewResponse> {
    let category = CategoryPath::new(request.category);
    let mut session = state.session.write().await;
    let view = session.select(category.clone())?;
    Ok(Json(ViewResponse::new(&category, &view)))
}

/// Reorder a category.
pub async fn reorder_handler(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<ReorderResponse> {
    let (category, order) = request.to_parts()?;
    let mut session = state.session.write().await;
    let edits = session.reorder(&category, &order)?;

    Ok(Json(ReorderResponse {
        success: true,
        edits,
        pending: session.pending_edits().len(),
    }))
}

/// Drop all pending edits.
pub async fn discard_handler(State(state): State<AppState>) -> ApiResult<DiscardResponse> {
    let mut session = state.session.write().await;
    let discarded = session.discard_edits()?;
    Ok(Json(DiscardResponse { discarded }))
}

// =============================================================================
// EXPORT HANDLERS
// =============================================================================

/// Render the patched document as a JSON report.
pub async fn export_handler(State(state): State<AppState>) -> ApiResult<ExportResponse> {
    let session = state.session.read().await;
    let outcome = session.render()?;
    Ok(Json(ExportResponse::new(DOWNLOAD_FILENAME, outcome)))
}

/// Render the patched document as a file download.
pub async fn download_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    let session = state.session.read().await;
    let outcome = session.render()?;

    if !outcome.is_complete() {
        tracing::warn!(
            skipped = outcome.skipped.len(),
            "Download contains only part of the pending edits"
        );
    }

    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        outcome.text,
    )
        .into_response())
}

// =============================================================================
// PUBLISH HANDLER
// =============================================================================

/// Send pending edits to the gateway as a priority batch.
pub async fn publish_handler(State(state): State<AppState>) -> ApiResult<PublishResponse> {
    let plan = {
        let session = state.session.read().await;
        session.priority_updates(state.shop_id, state.tree_id)?
    };

    if !plan.unresolved.is_empty() {
        tracing::warn!(
            unresolved = plan.unresolved.len(),
            "Some pending edits have no menu node id and are not published"
        );
    }

    if plan.batch.is_empty() {
        return Ok(Json(PublishResponse {
            success: true,
            sent: 0,
            unresolved: plan.unresolved,
            gateway: None,
        }));
    }

    let gateway = state
        .gateway
        .as_ref()
        .ok_or_else(|| MenuRankError::Config("No gateway URL configured".to_string()))?;
    let report = gateway.publish(&plan.batch).await?;

    Ok(Json(PublishResponse {
        success: true,
        sent: plan.batch.assignment_count(),
        unresolved: plan.unresolved,
        gateway: Some(report),
    }))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use menurank_core::EntryId;

    #[test]
    fn error_statuses() {
        assert_eq!(
            status_for(&MenuRankError::Structure("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&MenuRankError::UnknownEntry(
                EntryId::from("1"),
                CategoryPath::from("X")
            )),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&MenuRankError::NoDocument), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&MenuRankError::Transport("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&MenuRankError::Validation("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&MenuRankError::Io("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
