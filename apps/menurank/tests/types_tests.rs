//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use menurank::api::{
    EntryJson, ErrorResponse, ExportResponse, FetchRequest, HealthResponse, ReorderRequest,
    StatusResponse, ViewResponse,
};
use menurank_core::{
    AssignedPriority, CategoryPath, Entry, EntryId, MenuAssignment, MenuRankError, PatchOutcome,
    PriorityEdit, SkipReason, SkippedEdit,
};

fn entry(id: &str, path: &str, priority: AssignedPriority) -> Entry {
    Entry {
        id: EntryId::from(id),
        icon: Some(format!("https://cdn.example.com/{id}.jpg")),
        code: None,
        version_priority: None,
        assignments: vec![MenuAssignment {
            path: CategoryPath::from(path),
            priority,
            node_id: Some(440),
        }],
    }
}

// =============================================================================
// HEALTH / STATUS / ERROR
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        loaded: true,
        entries: 3,
        categories: 5,
        pending_edits: 2,
        active_category: Some("SKLEP\\Kurtki".to_string()),
        generated: None,
    };

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["loaded"], true);
    assert_eq!(json["pending_edits"], 2);
    assert_eq!(json["active_category"], "SKLEP\\Kurtki");
    assert!(json["generated"].is_null());
}

#[test]
fn test_error_response() {
    let error = ErrorResponse::new("no document loaded");
    let json = serde_json::to_string(&error).unwrap();
    assert_eq!(json, r#"{"success":false,"error":"no document loaded"}"#);
}

// =============================================================================
// REQUESTS
// =============================================================================

#[test]
fn test_fetch_request_url_is_optional() {
    let request: FetchRequest = serde_json::from_str("{}").unwrap();
    assert!(request.url.is_none());
}

#[test]
fn test_reorder_request_to_parts() {
    let request: ReorderRequest =
        serde_json::from_str(r#"{"category":"SKLEP\\Kurtki","order":["3","1"]}"#).unwrap();

    let (category, order) = request.to_parts().unwrap();
    assert_eq!(category.as_str(), "SKLEP\\Kurtki");
    assert_eq!(order, vec![EntryId::from("3"), EntryId::from("1")]);
}

#[test]
fn test_reorder_request_rejects_blank_category() {
    let request = ReorderRequest {
        category: "  ".to_string(),
        order: vec!["1".to_string()],
    };
    assert!(matches!(request.to_parts(), Err(MenuRankError::InvalidOrder(_))));
}

#[test]
fn test_reorder_request_rejects_empty_id() {
    let request = ReorderRequest {
        category: "X".to_string(),
        order: vec!["1".to_string(), String::new()],
    };
    assert!(matches!(request.to_parts(), Err(MenuRankError::InvalidOrder(_))));
}

#[test]
fn test_reorder_request_rejects_empty_order() {
    let request = ReorderRequest {
        category: "X".to_string(),
        order: Vec::new(),
    };
    assert!(matches!(request.to_parts(), Err(MenuRankError::InvalidOrder(_))));
}

#[test]
fn test_reorder_request_missing_order_fails() {
    assert!(serde_json::from_str::<ReorderRequest>(r#"{"category":"X"}"#).is_err());
}

// =============================================================================
// VIEW
// =============================================================================

#[test]
fn test_entry_json_marks_undeclared() {
    let declared = entry("1", "X", AssignedPriority::Declared(7));
    let undeclared = entry("2", "X", AssignedPriority::Undeclared);
    let x = CategoryPath::from("X");

    let row = EntryJson::from_entry(&declared, &x).unwrap();
    assert_eq!(row.priority, 7);
    assert!(row.declared);

    let row = EntryJson::from_entry(&undeclared, &x).unwrap();
    assert_eq!(row.priority, 0);
    assert!(!row.declared);

    assert!(EntryJson::from_entry(&declared, &CategoryPath::from("Y")).is_none());
}

#[test]
fn test_view_response_keeps_order() {
    let a = entry("10", "X", AssignedPriority::Declared(1));
    let b = entry("2", "X", AssignedPriority::Declared(9));
    let view = ViewResponse::new(&CategoryPath::from("X"), &[&b, &a]);

    let ids: Vec<&str> = view.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "10"]);
    assert_eq!(view.category, "X");
}

// =============================================================================
// EXPORT
// =============================================================================

#[test]
fn test_export_response_encodes_text() {
    let outcome = PatchOutcome {
        text: "<offer/>".to_string(),
        applied: 0,
        skipped: vec![SkippedEdit {
            edit: PriorityEdit::new(EntryId::from("9"), CategoryPath::from("X"), 5),
            reason: SkipReason::EntryNotFound,
        }],
        generated_refreshed: false,
    };

    let export = ExportResponse::new("updated_products.xml", outcome);
    assert_eq!(export.data, "PG9mZmVyLz4=");
    assert_eq!(export.skipped.len(), 1);

    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["skipped"][0]["reason"], "entry_not_found");
}
