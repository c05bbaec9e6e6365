//! # Priority Updates
//!
//! Wire shape of a priority publish: per entry, the new priority of each
//! touched menu node. Only these fields ever leave the process; the full
//! record never does.
//!
//! ```json
//! {"updates":[{"entryId":"5235","categoryAssignments":[
//!   {"nodeId":440,"priority":10,"shopId":1,"treeId":1}]}]}
//! ```

use crate::{Entry, EntryId, PriorityEdit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// New priority of one entry under one remote menu node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssignmentUpdate {
    pub node_id: u64,
    pub priority: i64,
    pub shop_id: u32,
    pub tree_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityUpdate {
    pub entry_id: EntryId,
    pub category_assignments: Vec<CategoryAssignmentUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityUpdateBatch {
    pub updates: Vec<PriorityUpdate>,
}

/// A batch plus the edits that could not be addressed remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePlan {
    pub batch: PriorityUpdateBatch,
    /// Edits whose entry or assignment has no remote node id.
    pub unresolved: Vec<PriorityEdit>,
}

impl PriorityUpdateBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Number of (entry, node) assignments in the batch.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.updates.iter().map(|u| u.category_assignments.len()).sum()
    }

    /// Group `edits` by entry, resolving each path to its node id.
    ///
    /// Entries appear in the order of their first edit.
    #[must_use]
    pub fn plan(entries: &[Entry], edits: &[PriorityEdit], shop_id: u32, tree_id: u32) -> UpdatePlan {
        let by_id: BTreeMap<&EntryId, &Entry> = entries.iter().map(|e| (&e.id, e)).collect();
        let mut slots: BTreeMap<&EntryId, usize> = BTreeMap::new();
        let mut plan = UpdatePlan::default();

        for edit in edits {
            let node_id = by_id
                .get(&edit.entry)
                .and_then(|e| e.assignment(&edit.path))
                .and_then(|a| a.node_id);
            let Some(node_id) = node_id else {
                plan.unresolved.push(edit.clone());
                continue;
            };

            let slot = *slots.entry(&edit.entry).or_insert_with(|| {
                plan.batch.updates.push(PriorityUpdate {
                    entry_id: edit.entry.clone(),
                    category_assignments: Vec::new(),
                });
                plan.batch.updates.len() - 1
            });
            plan.batch.updates[slot]
                .category_assignments
                .push(CategoryAssignmentUpdate {
                    node_id,
                    priority: edit.priority,
                    shop_id,
                    tree_id,
                });
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssignedPriority, CategoryPath, MenuAssignment};

    fn entries() -> Vec<Entry> {
        vec![Entry {
            id: EntryId::from("5235"),
            icon: None,
            code: None,
            version_priority: None,
            assignments: vec![
                MenuAssignment {
                    path: CategoryPath::from("A"),
                    priority: AssignedPriority::Declared(1),
                    node_id: Some(440),
                },
                MenuAssignment {
                    path: CategoryPath::from("A\\B"),
                    priority: AssignedPriority::Declared(1),
                    node_id: None,
                },
            ],
        }]
    }

    #[test]
    fn groups_by_entry_and_resolves_nodes() {
        let edits = vec![
            PriorityEdit::new(EntryId::from("5235"), CategoryPath::from("A"), 10),
            PriorityEdit::new(EntryId::from("5235"), CategoryPath::from("A\\B"), 10),
            PriorityEdit::new(EntryId::from("1"), CategoryPath::from("A"), 9),
        ];
        let plan = PriorityUpdateBatch::plan(&entries(), &edits, 1, 2);

        assert_eq!(plan.batch.updates.len(), 1);
        assert_eq!(plan.batch.assignment_count(), 1);
        assert_eq!(plan.unresolved.len(), 2);
        assert_eq!(plan.batch.updates[0].category_assignments[0].tree_id, 2);
    }

    #[test]
    fn serializes_camel_case() {
        let edits = vec![PriorityEdit::new(EntryId::from("5235"), CategoryPath::from("A"), 10)];
        let plan = PriorityUpdateBatch::plan(&entries(), &edits, 1, 1);
        let json = serde_json::to_string(&plan.batch).expect("serialize");
        assert_eq!(
            json,
            r#"{"updates":[{"entryId":"5235","categoryAssignments":[{"nodeId":440,"priority":10,"shopId":1,"treeId":1}]}]}"#
        );
    }

    #[test]
    fn empty_edits_give_empty_batch() {
        let plan = PriorityUpdateBatch::plan(&entries(), &[], 1, 1);
        assert!(plan.batch.is_empty());
        assert!(plan.unresolved.is_empty());
    }
}
