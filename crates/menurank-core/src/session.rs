//! # Session Module
//!
//! The single live editing context: one loaded document, the active
//! category, and the edits made since the load.
//!
//! - Loading parses first; a failed parse leaves the previous state intact
//! - A successful load discards the previous document and all pending edits
//! - Reorders are applied to the in-memory entries immediately, so views
//!   reflect them; the raw text only changes in [`Session::render`] output

use crate::ledger::PriorityLedger;
use crate::patch::{PatchEngine, PatchOutcome};
use crate::primitives::MAX_ORDER_LENGTH;
use crate::update::{PriorityUpdateBatch, UpdatePlan};
use crate::{CategoryPath, Document, Entry, EntryId, MenuRankError, PriorityEdit};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counts reported after a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub entries: usize,
    pub categories: usize,
    pub generated: Option<String>,
}

/// Editing context around one loaded document.
#[derive(Debug, Default)]
pub struct Session {
    ledger: PriorityLedger,
    engine: PatchEngine,
    document: Option<Document>,
    active: Option<CategoryPath>,
    pending: Vec<PriorityEdit>,
}

impl Session {
    #[must_use]
    pub fn new(ledger: PriorityLedger, engine: PatchEngine) -> Self {
        Self {
            ledger,
            engine,
            document: None,
            active: None,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &PriorityLedger {
        &self.ledger
    }

    #[must_use]
    pub fn engine(&self) -> &PatchEngine {
        &self.engine
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Replace the current document with `raw`.
    pub fn load(&mut self, raw: impl Into<String>) -> Result<LoadSummary, MenuRankError> {
        let document = Document::parse(raw)?;
        let summary = LoadSummary {
            entries: document.entries().len(),
            categories: document.categories().len(),
            generated: document.generated().map(str::to_owned),
        };

        if !self.pending.is_empty() {
            tracing::info!(discarded = self.pending.len(), "Load discards pending edits");
        }
        self.document = Some(document);
        self.active = None;
        self.pending.clear();

        tracing::info!(
            entries = summary.entries,
            categories = summary.categories,
            "Document loaded"
        );
        Ok(summary)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Result<&Document, MenuRankError> {
        self.document.as_ref().ok_or(MenuRankError::NoDocument)
    }

    pub fn categories(&self) -> Result<&[CategoryPath], MenuRankError> {
        Ok(self.document()?.categories())
    }

    // =========================================================================
    // SELECTION & VIEW
    // =========================================================================

    /// Make `category` active and return its view.
    pub fn select(&mut self, category: CategoryPath) -> Result<Vec<&Entry>, MenuRankError> {
        self.known_category(&category)?;
        self.active = Some(category);
        match &self.active {
            Some(active) => self.view(active),
            None => Ok(Vec::new()),
        }
    }

    #[must_use]
    pub fn active_category(&self) -> Option<&CategoryPath> {
        self.active.as_ref()
    }

    /// Entries under `category`, highest priority first, pending edits
    /// included.
    pub fn view(&self, category: &CategoryPath) -> Result<Vec<&Entry>, MenuRankError> {
        let document = self.known_category(category)?;
        Ok(self.ledger.view(document.entries(), category))
    }

    fn known_category(&self, category: &CategoryPath) -> Result<&Document, MenuRankError> {
        let document = self.document()?;
        if document.has_category(category) {
            Ok(document)
        } else {
            Err(MenuRankError::UnknownCategory(category.clone()))
        }
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Reorder `category` so `order` reads top to bottom.
    ///
    /// `order` may be partial; entries left out keep their priority. Linked
    /// paths are only edited on entries that hold them. Returns the edits
    /// recorded as pending.
    pub fn reorder(
        &mut self,
        category: &CategoryPath,
        order: &[EntryId],
    ) -> Result<Vec<PriorityEdit>, MenuRankError> {
        self.validate_order(category, order)?;

        let edits = self.ledger.reorder(category, order);
        let document = self.document.as_mut().ok_or(MenuRankError::NoDocument)?;

        let mut recorded = Vec::with_capacity(edits.len());
        for edit in edits {
            let held = document
                .entries_mut()
                .iter_mut()
                .find(|e| e.id == edit.entry)
                .is_some_and(|e| e.set_priority(&edit.path, edit.priority));
            if held {
                recorded.push(edit);
            }
        }

        for edit in &recorded {
            match self
                .pending
                .iter_mut()
                .find(|p| p.entry == edit.entry && p.path == edit.path)
            {
                Some(existing) => existing.priority = edit.priority,
                None => self.pending.push(edit.clone()),
            }
        }

        tracing::debug!(
            category = %category,
            edits = recorded.len(),
            pending = self.pending.len(),
            "Reorder recorded"
        );
        Ok(recorded)
    }

    fn validate_order(&self, category: &CategoryPath, order: &[EntryId]) -> Result<(), MenuRankError> {
        let document = self.known_category(category)?;

        if order.len() > MAX_ORDER_LENGTH {
            return Err(MenuRankError::InvalidOrder(format!(
                "{} ids exceeds maximum {}",
                order.len(),
                MAX_ORDER_LENGTH
            )));
        }

        let mut seen = BTreeSet::new();
        for id in order {
            if !seen.insert(id) {
                return Err(MenuRankError::InvalidOrder(format!(
                    "entry {} appears more than once",
                    id
                )));
            }
            if !document.entry(id).is_some_and(|e| e.has_path(category)) {
                return Err(MenuRankError::UnknownEntry(id.clone(), category.clone()));
            }
        }
        Ok(())
    }

    /// Edits made since the last load, one per (entry, path), latest value.
    #[must_use]
    pub fn pending_edits(&self) -> &[PriorityEdit] {
        &self.pending
    }

    /// Drop all pending edits and restore the loaded priorities.
    ///
    /// Returns the number of edits discarded.
    pub fn discard_edits(&mut self) -> Result<usize, MenuRankError> {
        let document = self.document.as_mut().ok_or(MenuRankError::NoDocument)?;
        let discarded = self.pending.len();
        if discarded > 0 {
            *document = Document::parse(document.raw().to_owned())?;
            self.pending.clear();
            tracing::info!(discarded, "Pending edits discarded");
        }
        Ok(discarded)
    }

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Patched document text with all pending edits. The session is not
    /// modified.
    pub fn render(&self) -> Result<PatchOutcome, MenuRankError> {
        let document = self.document()?;
        Ok(self.engine.patch(document.raw(), &self.pending))
    }

    /// Like [`Session::render`] with an explicit timestamp.
    pub fn render_at(&self, now: NaiveDateTime) -> Result<PatchOutcome, MenuRankError> {
        let document = self.document()?;
        Ok(self.engine.patch_at(document.raw(), &self.pending, now))
    }

    /// Pending edits as a publishable batch.
    pub fn priority_updates(&self, shop_id: u32, tree_id: u32) -> Result<UpdatePlan, MenuRankError> {
        let document = self.document()?;
        Ok(PriorityUpdateBatch::plan(
            document.entries(),
            &self.pending,
            shop_id,
            tree_id,
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::PatchOptions;

    const DOC: &str = r#"<offer generated="2024-01-01 00:00:00"><products>
<product id="1"><item id="11" textId="X" level="5"/><item textId="Y" level="1"/></product>
<product id="2"><item id="12" textId="X" level="5"/></product>
<product id="3"><item textId="X" level="5"/><item textId="Y" level="2"/></product>
</products></offer>"#;

    fn loaded() -> Session {
        let mut session = Session::default();
        session.load(DOC).expect("load");
        session
    }

    fn ids(view: &[&Entry]) -> Vec<String> {
        view.iter().map(|e| e.id.to_string()).collect()
    }

    fn order(ids: &[&str]) -> Vec<EntryId> {
        ids.iter().copied().map(EntryId::from).collect()
    }

    #[test]
    fn operations_need_a_document() {
        let session = Session::default();
        assert!(matches!(session.categories(), Err(MenuRankError::NoDocument)));
        assert!(matches!(session.render(), Err(MenuRankError::NoDocument)));
    }

    #[test]
    fn load_reports_counts() {
        let mut session = Session::default();
        let summary = session.load(DOC).expect("load");
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.generated.as_deref(), Some("2024-01-01 00:00:00"));
    }

    #[test]
    fn failed_load_keeps_previous_state() {
        let mut session = loaded();
        let x = CategoryPath::from("X");
        session.reorder(&x, &order(&["1"])).expect("reorder");

        assert!(session.load("<broken").is_err());
        assert_eq!(session.pending_edits().len(), 1);
        assert_eq!(session.document().expect("doc").entries().len(), 3);
    }

    #[test]
    fn select_sets_active_and_rejects_unknown() {
        let mut session = loaded();
        let view = session.select(CategoryPath::from("Y")).expect("select");
        assert_eq!(ids(&view), vec!["3", "1"]);
        assert_eq!(session.active_category().map(CategoryPath::as_str), Some("Y"));

        let err = session.select(CategoryPath::from("Z")).expect_err("unknown");
        assert!(matches!(err, MenuRankError::UnknownCategory(_)));
        assert_eq!(session.active_category().map(CategoryPath::as_str), Some("Y"));
    }

    #[test]
    fn reorder_updates_view_and_pending() {
        let mut session = Session::new(PriorityLedger::with_base(10), PatchEngine::default());
        session.load(DOC).expect("load");
        let x = CategoryPath::from("X");

        assert_eq!(ids(&session.view(&x).expect("view")), vec!["3", "2", "1"]);
        let edits = session.reorder(&x, &order(&["1", "3", "2"])).expect("reorder");
        assert_eq!(edits.len(), 3);
        assert_eq!(ids(&session.view(&x).expect("view")), vec!["1", "3", "2"]);

        let y = CategoryPath::from("Y");
        assert_eq!(ids(&session.view(&y).expect("view")), vec!["3", "1"]);
    }

    #[test]
    fn reorder_rejects_duplicates_and_strangers() {
        let mut session = loaded();
        let y = CategoryPath::from("Y");

        let err = session.reorder(&y, &order(&["1", "1"])).expect_err("dup");
        assert!(matches!(err, MenuRankError::InvalidOrder(_)));

        let err = session.reorder(&y, &order(&["2"])).expect_err("stranger");
        assert!(matches!(err, MenuRankError::UnknownEntry(_, _)));
        assert!(session.pending_edits().is_empty());
    }

    #[test]
    fn repeated_reorders_keep_one_pending_edit_per_pair() {
        let mut session = loaded();
        let x = CategoryPath::from("X");
        session.reorder(&x, &order(&["1", "2"])).expect("first");
        session.reorder(&x, &order(&["2", "1"])).expect("second");

        let pending = session.pending_edits();
        assert_eq!(pending.len(), 2);
        assert!(pending
            .iter()
            .any(|e| e.entry.as_str() == "2" && e.priority == 1000));
    }

    #[test]
    fn discard_restores_loaded_priorities() {
        let mut session = loaded();
        let x = CategoryPath::from("X");
        session.reorder(&x, &order(&["1"])).expect("reorder");

        assert_eq!(session.discard_edits().expect("discard"), 1);
        let entry = session.document().expect("doc").entry(&EntryId::from("1")).expect("entry");
        assert_eq!(entry.priority_in(&x), Some(5));
        assert!(session.pending_edits().is_empty());
    }

    #[test]
    fn render_is_non_destructive() {
        let mut session = Session::new(
            PriorityLedger::with_base(10),
            PatchEngine::new(PatchOptions {
                refresh_generated: false,
                ..PatchOptions::default()
            }),
        );
        session.load(DOC).expect("load");
        session
            .reorder(&CategoryPath::from("Y"), &order(&["1", "3"]))
            .expect("reorder");

        let out = session.render().expect("render");
        assert_eq!(out.applied, 2);
        assert!(out.text.contains(r#"<item textId="Y" level="10"/>"#));
        assert!(out.text.contains(r#"<item textId="Y" level="9"/>"#));
        assert_eq!(session.document().expect("doc").raw(), DOC);
    }

    #[test]
    fn updates_resolve_node_ids() {
        let mut session = loaded();
        session
            .reorder(&CategoryPath::from("X"), &order(&["1", "2", "3"]))
            .expect("reorder");

        let plan = session.priority_updates(1, 1).expect("plan");
        assert_eq!(plan.batch.updates.len(), 2);
        assert_eq!(plan.unresolved.len(), 1);
        assert_eq!(plan.unresolved[0].entry.as_str(), "3");
    }
}
