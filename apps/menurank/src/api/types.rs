//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use menurank_core::{
    CategoryPath, Entry, EntryId, LoadSummary, MenuRankError, PatchOutcome, PriorityEdit,
    SkippedEdit, primitives::MAX_ORDER_LENGTH,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Session status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub loaded: bool,
    pub entries: usize,
    pub categories: usize,
    pub pending_edits: usize,
    pub active_category: Option<String>,
    pub generated: Option<String>,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body returned with any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

// =============================================================================
// LOAD REQUEST/RESPONSE
// =============================================================================

/// Optional body of `POST /document/fetch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Overrides the configured source URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// Document load response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResponse {
    pub success: bool,
    pub entries: usize,
    pub categories: usize,
    pub generated: Option<String>,
}

impl From<LoadSummary> for LoadResponse {
    fn from(summary: LoadSummary) -> Self {
        Self {
            success: true,
            entries: summary.entries,
            categories: summary.categories,
            generated: summary.generated,
        }
    }
}

// =============================================================================
// CATEGORIES RESPONSE
// =============================================================================

/// One category with the number of entries ranked under it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryJson {
    pub path: String,
    pub depth: usize,
    pub entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryJson>,
}

// =============================================================================
// VIEW REQUEST/RESPONSE
// =============================================================================

/// Ledger view request; also makes the category active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewRequest {
    pub category: String,
}

/// One row of a ledger view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryJson {
    pub id: String,
    pub icon: Option<String>,
    pub code: Option<String>,
    pub priority: i64,
    /// False when the document carries no value for this path.
    pub declared: bool,
}

impl EntryJson {
    /// Row for `entry` under `category`; `None` if the entry is not ranked there.
    pub fn from_entry(entry: &Entry, category: &CategoryPath) -> Option<Self> {
        let assignment = entry.assignment(category)?;
        Some(Self {
            id: entry.id.to_string(),
            icon: entry.icon.clone(),
            code: entry.code.clone(),
            priority: assignment.priority.value(),
            declared: assignment.priority.is_declared(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub category: String,
    pub entries: Vec<EntryJson>,
}

impl ViewResponse {
    pub fn new(category: &CategoryPath, view: &[&Entry]) -> Self {
        Self {
            category: category.to_string(),
            entries: view
                .iter()
                .filter_map(|e| EntryJson::from_entry(e, category))
                .collect(),
        }
    }
}

// =============================================================================
// REORDER REQUEST/RESPONSE
// =============================================================================

/// New top-to-bottom order for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub category: String,
    pub order: Vec<String>,
}

impl ReorderRequest {
    /// Validate sizes and convert to core types.
    pub fn to_parts(&self) -> Result<(CategoryPath, Vec<EntryId>), MenuRankError> {
        if self.category.trim().is_empty() {
            return Err(MenuRankError::InvalidOrder("category is empty".to_string()));
        }
        if self.order.is_empty() {
            return Err(MenuRankError::InvalidOrder("order is empty".to_string()));
        }
        if self.order.len() > MAX_ORDER_LENGTH {
            return Err(MenuRankError::InvalidOrder(format!(
                "{} ids exceeds maximum {}",
                self.order.len(),
                MAX_ORDER_LENGTH
            )));
        }
        if self.order.iter().any(|id| id.is_empty()) {
            return Err(MenuRankError::InvalidOrder("empty entry id".to_string()));
        }

        Ok((
            CategoryPath::new(self.category.clone()),
            self.order.iter().map(|id| EntryId::new(id.clone())).collect(),
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResponse {
    pub success: bool,
    /// Edits recorded by this reorder (category plus linked paths).
    pub edits: Vec<PriorityEdit>,
    /// Total pending edits in the session.
    pub pending: usize,
}

/// Response of `DELETE /ledger/pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscardResponse {
    pub discarded: usize,
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub filename: String,
    pub data: String, // Base64 encoded
    pub applied: usize,
    pub skipped: Vec<SkippedEdit>,
    pub generated_refreshed: bool,
}

impl ExportResponse {
    pub fn new(filename: &str, outcome: PatchOutcome) -> Self {
        Self {
            success: true,
            filename: filename.to_string(),
            data: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                outcome.text.as_bytes(),
            ),
            applied: outcome.applied,
            skipped: outcome.skipped,
            generated_refreshed: outcome.generated_refreshed,
        }
    }
}

// =============================================================================
// PUBLISH RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResponse {
    pub success: bool,
    /// Number of (entry, node) assignments sent.
    pub sent: usize,
    /// Pending edits without a remote node id; not sent.
    pub unresolved: Vec<PriorityEdit>,
    /// Report returned by the gateway, if it was called.
    pub gateway: Option<serde_json::Value>,
}
