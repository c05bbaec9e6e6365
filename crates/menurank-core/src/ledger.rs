//! # Priority Ledger
//!
//! Per-category ordering of entries and the priority deltas produced by a
//! reorder.
//!
//! ## Ordering
//!
//! A view lists the entries holding a path by descending priority; equal
//! priorities fall back to descending [`EntryId`] order. Because every
//! assignment carries its own priority, reordering one category never
//! changes another one, except for paths the [`AliasPolicy`] links.

use crate::alias::{AliasPolicy, AliasRule, AliasTable, NoAliases};
use crate::primitives::DEFAULT_PRIORITY_BASE;
use crate::{CategoryPath, Entry, EntryId, PriorityEdit};
use serde::{Deserialize, Serialize};

// =============================================================================
// CONFIGURATION
// =============================================================================

fn default_base() -> i64 {
    DEFAULT_PRIORITY_BASE
}

/// Operator settings for the ledger (`[ledger]` config section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Priority given to the first position of a reorder.
    #[serde(default = "default_base")]
    pub base: i64,
    #[serde(default)]
    pub aliases: Vec<AliasRule>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base: DEFAULT_PRIORITY_BASE,
            aliases: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Build a ledger; an empty alias list yields [`NoAliases`].
    #[must_use]
    pub fn build(&self) -> PriorityLedger {
        if self.aliases.is_empty() {
            PriorityLedger::new(self.base, NoAliases)
        } else {
            PriorityLedger::new(self.base, AliasTable::new(&self.aliases))
        }
    }
}

// =============================================================================
// LEDGER
// =============================================================================

/// Stateless ordering and delta computation over a slice of entries.
#[derive(Debug)]
pub struct PriorityLedger {
    base: i64,
    aliases: Box<dyn AliasPolicy>,
}

impl Default for PriorityLedger {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY_BASE, NoAliases)
    }
}

impl PriorityLedger {
    #[must_use]
    pub fn new(base: i64, aliases: impl AliasPolicy + 'static) -> Self {
        Self {
            base,
            aliases: Box::new(aliases),
        }
    }

    /// Ledger with the given base and no aliases.
    #[must_use]
    pub fn with_base(base: i64) -> Self {
        Self::new(base, NoAliases)
    }

    #[must_use]
    pub fn base(&self) -> i64 {
        self.base
    }

    #[must_use]
    pub fn aliases(&self) -> &dyn AliasPolicy {
        self.aliases.as_ref()
    }

    /// Priority assigned to position `index` of a reorder.
    #[must_use]
    pub fn priority_at(&self, index: usize) -> i64 {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.base.saturating_sub(index)
    }

    /// Entries holding `category`, highest priority first.
    #[must_use]
    pub fn view<'a>(&self, entries: &'a [Entry], category: &CategoryPath) -> Vec<&'a Entry> {
        let mut ranked: Vec<(i64, &'a Entry)> = entries
            .iter()
            .filter_map(|e| e.priority_in(category).map(|p| (p, e)))
            .collect();

        ranked.sort_by(|(pa, a), (pb, b)| pb.cmp(pa).then_with(|| b.id.cmp(&a.id)));
        ranked.into_iter().map(|(_, e)| e).collect()
    }

    /// Edits that realise `order` under `category`.
    ///
    /// Position `i` receives `base - i`. The same values are then emitted for
    /// every path linked to `category`. Nothing is validated or applied here.
    #[must_use]
    pub fn reorder(&self, category: &CategoryPath, order: &[EntryId]) -> Vec<PriorityEdit> {
        let linked = self.aliases.linked(category);
        let mut edits = Vec::with_capacity(order.len() * (1 + linked.len()));

        for path in std::iter::once(category).chain(linked.iter()) {
            edits.extend(order.iter().enumerate().map(|(index, id)| {
                PriorityEdit::new(id.clone(), path.clone(), self.priority_at(index))
            }));
        }

        edits
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssignedPriority, MenuAssignment};

    fn entry(id: &str, assignments: &[(&str, Option<i64>)]) -> Entry {
        Entry {
            id: EntryId::from(id),
            icon: None,
            code: None,
            version_priority: None,
            assignments: assignments
                .iter()
                .map(|(path, priority)| MenuAssignment {
                    path: CategoryPath::from(*path),
                    priority: priority.map_or(AssignedPriority::Undeclared, AssignedPriority::Declared),
                    node_id: None,
                })
                .collect(),
        }
    }

    fn ids(view: &[&Entry]) -> Vec<String> {
        view.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn view_orders_by_priority_desc() {
        let entries = vec![
            entry("1", &[("X", Some(3))]),
            entry("2", &[("X", Some(9))]),
            entry("3", &[("Y", Some(100))]),
        ];
        let ledger = PriorityLedger::default();
        let view = ledger.view(&entries, &CategoryPath::from("X"));
        assert_eq!(ids(&view), vec!["2", "1"]);
    }

    #[test]
    fn view_ties_break_by_id_desc() {
        let entries = vec![
            entry("1", &[("X", Some(5))]),
            entry("10", &[("X", Some(5))]),
            entry("2", &[("X", Some(5))]),
        ];
        let view = PriorityLedger::default().view(&entries, &CategoryPath::from("X"));
        assert_eq!(ids(&view), vec!["10", "2", "1"]);
    }

    #[test]
    fn undeclared_sorts_as_zero() {
        let entries = vec![
            entry("1", &[("X", None)]),
            entry("2", &[("X", Some(-1))]),
            entry("3", &[("X", Some(1))]),
        ];
        let view = PriorityLedger::default().view(&entries, &CategoryPath::from("X"));
        assert_eq!(ids(&view), vec!["3", "1", "2"]);
    }

    #[test]
    fn view_of_unknown_category_is_empty() {
        let entries = vec![entry("1", &[("X", Some(1))])];
        assert!(PriorityLedger::default()
            .view(&entries, &CategoryPath::from("Z"))
            .is_empty());
    }

    #[test]
    fn reorder_counts_down_from_base() {
        let ledger = PriorityLedger::with_base(10);
        let order: Vec<EntryId> = ["1", "3", "2"].into_iter().map(EntryId::from).collect();
        let edits = ledger.reorder(&CategoryPath::from("X"), &order);

        let got: Vec<(&str, i64)> = edits.iter().map(|e| (e.entry.as_str(), e.priority)).collect();
        assert_eq!(got, vec![("1", 10), ("3", 9), ("2", 8)]);
        assert!(edits.iter().all(|e| e.path.as_str() == "X"));
    }

    #[test]
    fn reorder_repeats_for_linked_paths() {
        let rules = vec![AliasRule {
            category: CategoryPath::from("A"),
            linked: vec![CategoryPath::from("A\\All")],
            symmetric: false,
        }];
        let ledger = LedgerConfig { base: 5, aliases: rules }.build();
        let order = vec![EntryId::from("7"), EntryId::from("8")];
        let edits = ledger.reorder(&CategoryPath::from("A"), &order);

        assert_eq!(edits.len(), 4);
        assert_eq!(edits[2].path.as_str(), "A\\All");
        assert_eq!(edits[2].priority, 5);
        assert_eq!(edits[3].priority, 4);
    }

    #[test]
    fn priority_saturates_instead_of_overflowing() {
        let ledger = PriorityLedger::with_base(i64::MIN + 1);
        assert_eq!(ledger.priority_at(5), i64::MIN);
    }

    #[test]
    fn config_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.base, DEFAULT_PRIORITY_BASE);
        assert_eq!(config.build().base(), DEFAULT_PRIORITY_BASE);
    }
}
