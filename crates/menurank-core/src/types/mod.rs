//! # Core Type Definitions
//!
//! This module contains the typed document model shared by every component:
//! - Identifiers (`EntryId`, `CategoryPath`)
//! - Priority values (`AssignedPriority`, `PriorityEdit`)
//! - Parsed records (`Entry`, `MenuAssignment`)
//! - Error types (`MenuRankError`)
//!
//! ## Ordering Guarantees
//!
//! All identifiers implement `Ord` so they can key `BTreeMap`/`BTreeSet`.
//! `EntryId` carries a single total order (see [`EntryId::cmp`]) that is used
//! for every tie-break in the crate.

use crate::primitives::{PATH_DELIMITER, UNDECLARED_PRIORITY};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENTRY IDENTIFIER
// =============================================================================

/// Stable identifier of a catalog entry (the `id` attribute of a product).
///
/// Ids are kept as the exact string found in the document so the patch
/// engine can match them byte-for-byte. Ordering is defined once, here:
///
/// - an id made only of ASCII digits compares by numeric value
///   (leading zeros ignored, no width limit);
/// - any other id compares shortlex (length first, then bytes);
/// - the raw string breaks remaining ties so `Ord` agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a new entry id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view of the id, if it is a plain unsigned decimal.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        if self.is_numeric() {
            self.0.parse().ok()
        } else {
            None
        }
    }

    fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// Comparison key: significant part of the id.
    fn significant(&self) -> &str {
        if self.is_numeric() {
            let trimmed = self.0.trim_start_matches('0');
            if trimmed.is_empty() { "0" } else { trimmed }
        } else {
            &self.0
        }
    }
}

impl Ord for EntryId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for EntryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// CATEGORY PATH
// =============================================================================

/// Hierarchical category identifier, `\`-delimited (e.g. `SKLEP\Kurtki`).
///
/// A category has no stored entity of its own: it is identified solely by
/// its full path string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryPath(pub String);

impl CategoryPath {
    /// Create a new category path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Get the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Non-empty segments of the path, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_DELIMITER).filter(|s| !s.is_empty())
    }

    /// Number of non-empty segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// PRIORITIES
// =============================================================================

/// Priority of one assignment as found in the document.
///
/// `Undeclared` is an explicit variant rather than a magic number so callers
/// can tell "the document says 0" from "the document says nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AssignedPriority {
    /// The document carries a priority value for this path.
    Declared(i64),
    /// No priority-bearing element exists for this path.
    Undeclared,
}

impl AssignedPriority {
    /// Effective value; `Undeclared` reads as [`UNDECLARED_PRIORITY`].
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::Declared(v) => v,
            Self::Undeclared => UNDECLARED_PRIORITY,
        }
    }

    #[must_use]
    pub const fn is_declared(self) -> bool {
        matches!(self, Self::Declared(_))
    }
}

/// One requested priority change: set `priority` for `entry` under `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEdit {
    pub entry: EntryId,
    pub path: CategoryPath,
    pub priority: i64,
}

impl PriorityEdit {
    #[must_use]
    pub fn new(entry: EntryId, path: CategoryPath, priority: i64) -> Self {
        Self {
            entry,
            path,
            priority,
        }
    }
}

// =============================================================================
// PARSED RECORDS
// =============================================================================

/// The pairing of one entry with one category path and its priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAssignment {
    pub path: CategoryPath,
    pub priority: AssignedPriority,
    /// Remote menu-node id, when the declaring element carries one.
    pub node_id: Option<u64>,
}

/// One catalog item subject to per-category display ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Display-asset reference (icon URL).
    pub icon: Option<String>,
    /// Secondary code shown on the product card.
    pub code: Option<String>,
    /// Product-level `version_priority`, when present.
    pub version_priority: Option<i64>,
    /// Assignments in document order; paths are unique.
    pub assignments: Vec<MenuAssignment>,
}

impl Entry {
    /// Find the assignment for `path`.
    #[must_use]
    pub fn assignment(&self, path: &CategoryPath) -> Option<&MenuAssignment> {
        self.assignments.iter().find(|a| &a.path == path)
    }

    /// Check whether the entry is ranked under `path`.
    #[must_use]
    pub fn has_path(&self, path: &CategoryPath) -> bool {
        self.assignment(path).is_some()
    }

    /// Effective priority under `path`, if assigned.
    #[must_use]
    pub fn priority_in(&self, path: &CategoryPath) -> Option<i64> {
        self.assignment(path).map(|a| a.priority.value())
    }

    /// Overwrite the priority for `path`.
    ///
    /// Returns `false` (and changes nothing) when the entry has no
    /// assignment for that path.
    pub fn set_priority(&mut self, path: &CategoryPath, priority: i64) -> bool {
        match self.assignments.iter_mut().find(|a| &a.path == path) {
            Some(assignment) => {
                assignment.priority = AssignedPriority::Declared(priority);
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in menurank.
///
/// Per-edit patch misses are NOT errors; they are reported through
/// `patch::PatchOutcome::skipped`.
#[derive(Debug, Error)]
pub enum MenuRankError {
    /// The input is not a well-formed export document.
    #[error("Structure error: expected <offer><products><product id=\"…\">…: {0}")]
    Structure(String),

    /// An operation needs a loaded document and none is loaded.
    #[error("No document loaded")]
    NoDocument,

    /// The category is not present in the loaded document.
    #[error("Unknown category: {0}")]
    UnknownCategory(CategoryPath),

    /// The entry is not ranked under the category.
    #[error("Entry {0} is not assigned to category {1}")]
    UnknownEntry(EntryId, CategoryPath),

    /// A reorder request is malformed (e.g. repeated ids).
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// A load or save over the network failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request carried fields outside the gateway allowlist.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_order_by_value() {
        let mut ids: Vec<EntryId> = ["10", "9", "100", "011"]
            .into_iter()
            .map(EntryId::from)
            .collect();
        ids.sort();
        let ordered: Vec<_> = ids.iter().map(EntryId::as_str).collect();
        assert_eq!(ordered, vec!["9", "10", "011", "100"]);
    }

    #[test]
    fn leading_zeros_tie_break_on_raw_string() {
        let a = EntryId::from("07");
        let b = EntryId::from("7");
        assert_ne!(a, b);
        assert_eq!(a.cmp(&b), "07".cmp("7"));
    }

    #[test]
    fn non_numeric_ids_order_shortlex() {
        assert!(EntryId::from("zz") < EntryId::from("aaa"));
        assert!(EntryId::from("ab") < EntryId::from("ac"));
        assert_eq!(EntryId::from("A-1").as_number(), None);
    }

    #[test]
    fn undeclared_priority_reads_as_sentinel() {
        assert_eq!(AssignedPriority::Undeclared.value(), UNDECLARED_PRIORITY);
        assert_eq!(AssignedPriority::Declared(7).value(), 7);
        assert!(!AssignedPriority::Undeclared.is_declared());
    }

    #[test]
    fn category_path_segments_skip_empty() {
        let path = CategoryPath::from("\\A\\\\B\\");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn set_priority_only_touches_existing_assignment() {
        let mut entry = Entry {
            id: EntryId::from("1"),
            icon: None,
            code: None,
            version_priority: None,
            assignments: vec![MenuAssignment {
                path: CategoryPath::from("X"),
                priority: AssignedPriority::Undeclared,
                node_id: None,
            }],
        };

        assert!(entry.set_priority(&CategoryPath::from("X"), 4));
        assert!(!entry.set_priority(&CategoryPath::from("Y"), 4));
        assert_eq!(entry.priority_in(&CategoryPath::from("X")), Some(4));
        assert_eq!(entry.priority_in(&CategoryPath::from("Y")), None);
    }
}
