//! # menurank-core
//!
//! Per-category display ranking for product export documents - THE LOGIC.
//!
//! A product appears under many menu categories and holds an independent
//! priority in each. This crate reads an export document into typed entries,
//! lets a caller view and reorder one category at a time, and writes the
//! resulting priorities back into the original text without disturbing any
//! other byte.
//!
//! ## Pipeline
//!
//! ```text
//! raw XML ──▶ Document::parse ──▶ PriorityLedger::view / reorder
//!                                          │
//!                                   Vec<PriorityEdit>
//!                                          │
//! raw XML ─────────────────────────▶ PatchEngine::patch ──▶ PatchOutcome
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - The loaded text is never modified; patching returns a new string
//! - One [`Session`] per live document, passed explicitly

// =============================================================================
// MODULES
// =============================================================================

pub mod alias;
pub mod document;
pub mod formats;
pub mod ledger;
pub mod patch;
pub mod path;
pub mod primitives;
pub mod session;
pub mod types;
pub mod update;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AssignedPriority, CategoryPath, Entry, EntryId, MenuAssignment, MenuRankError, PriorityEdit,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use alias::{AliasPolicy, AliasRule, AliasTable, NoAliases};
pub use document::Document;
pub use ledger::{LedgerConfig, PriorityLedger};
pub use patch::{PatchEngine, PatchOptions, PatchOutcome, SkipReason, SkippedEdit};
pub use path::PathExpander;
pub use session::{LoadSummary, Session};
pub use update::{CategoryAssignmentUpdate, PriorityUpdate, PriorityUpdateBatch, UpdatePlan};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{EncodingRole, PRIORITY_ENCODINGS, PriorityEncoding};
