//! # Field Allowlist
//!
//! Inbound batches are checked on the raw JSON before they are typed.
//! Every field outside the allowlist is removed and reported; a body that
//! is still not a valid [`PriorityUpdateBatch`] afterwards is rejected.
//!
//! | level      | allowed fields                              |
//! |------------|---------------------------------------------|
//! | batch      | `updates`                                   |
//! | update     | `entryId`, `categoryAssignments`            |
//! | assignment | `nodeId`, `priority`, `shopId`, `treeId`    |

use menurank_core::{MenuRankError, PriorityUpdateBatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const BATCH_FIELDS: &[&str] = &["updates"];
pub const UPDATE_FIELDS: &[&str] = &["entryId", "categoryAssignments"];
pub const ASSIGNMENT_FIELDS: &[&str] = &["nodeId", "priority", "shopId", "treeId"];

/// A field removed from the inbound body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// JSON location of the object that held the field, e.g. `updates[0]`.
    pub location: String,
    pub field: String,
}

/// A batch that passed the allowlist, with what was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub batch: PriorityUpdateBatch,
    pub stripped: Vec<FieldViolation>,
}

/// Strip disallowed fields from `body` and type it.
pub fn sanitize(mut body: Value) -> Result<Sanitized, MenuRankError> {
    let mut stripped = Vec::new();

    let root = as_object(&mut body, "body")?;
    strip(root, BATCH_FIELDS, "", &mut stripped);

    let updates = root
        .get_mut("updates")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| MenuRankError::Validation("updates must be an array".to_string()))?;

    for (i, update) in updates.iter_mut().enumerate() {
        let location = format!("updates[{}]", i);
        let update = as_object(update, &location)?;
        strip(update, UPDATE_FIELDS, &location, &mut stripped);

        let Some(assignments) = update
            .get_mut("categoryAssignments")
            .and_then(Value::as_array_mut)
        else {
            continue;
        };
        for (j, assignment) in assignments.iter_mut().enumerate() {
            let location = format!("{}.categoryAssignments[{}]", location, j);
            let assignment = as_object(assignment, &location)?;
            strip(assignment, ASSIGNMENT_FIELDS, &location, &mut stripped);
        }
    }

    for violation in &stripped {
        tracing::warn!(
            event = "allowlist_violation",
            location = %violation.location,
            field = %violation.field,
            "Removed field outside the allowlist"
        );
    }

    let batch: PriorityUpdateBatch = serde_json::from_value(body)
        .map_err(|e| MenuRankError::Validation(format!("Invalid priority batch: {}", e)))?;

    Ok(Sanitized { batch, stripped })
}

fn as_object<'a>(value: &'a mut Value, location: &str) -> Result<&'a mut Map<String, Value>, MenuRankError> {
    value
        .as_object_mut()
        .ok_or_else(|| MenuRankError::Validation(format!("{} must be an object", location)))
}

fn strip(
    object: &mut Map<String, Value>,
    allowed: &[&str],
    location: &str,
    stripped: &mut Vec<FieldViolation>,
) {
    let unexpected: Vec<String> = object
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .cloned()
        .collect();

    for field in unexpected {
        object.remove(&field);
        stripped.push(FieldViolation {
            location: location.to_string(),
            field,
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_batch_passes() {
        let body = json!({
            "updates": [{
                "entryId": "5235",
                "categoryAssignments": [{ "nodeId": 440, "priority": 10, "shopId": 1, "treeId": 1 }]
            }]
        });

        let sanitized = sanitize(body).expect("valid");
        assert!(sanitized.stripped.is_empty());
        assert_eq!(sanitized.batch.assignment_count(), 1);
    }

    #[test]
    fn extra_fields_are_removed_at_every_level() {
        let body = json!({
            "updates": [{
                "entryId": "5235",
                "name": "Kurtka",
                "categoryAssignments": [
                    { "nodeId": 440, "priority": 10, "shopId": 1, "treeId": 1, "price": 99 }
                ]
            }],
            "force": true
        });

        let sanitized = sanitize(body).expect("valid after stripping");
        let got: Vec<(&str, &str)> = sanitized
            .stripped
            .iter()
            .map(|v| (v.location.as_str(), v.field.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("", "force"),
                ("updates[0]", "name"),
                ("updates[0].categoryAssignments[0]", "price"),
            ]
        );
        assert_eq!(sanitized.batch.updates[0].category_assignments[0].priority, 10);
    }

    #[test]
    fn structural_errors_are_validation_errors() {
        for body in [
            json!([]),
            json!({}),
            json!({ "updates": {} }),
            json!({ "updates": [42] }),
            json!({ "updates": [{ "entryId": "1", "categoryAssignments": ["x"] }] }),
            json!({ "updates": [{ "entryId": "1" }] }),
            json!({ "updates": [{ "entryId": "1", "categoryAssignments": [{ "nodeId": 1 }] }] }),
        ] {
            let err = sanitize(body.clone()).expect_err("invalid");
            assert!(matches!(err, MenuRankError::Validation(_)), "{body}");
        }
    }

    #[test]
    fn empty_batch_is_valid() {
        let sanitized = sanitize(json!({ "updates": [] })).expect("valid");
        assert!(sanitized.batch.is_empty());
    }
}
