//! # Alias Policy
//!
//! Some storefronts mirror one category under another path (e.g. a
//! "see all" node under its parent). A reorder of the first is then
//! repeated for the second. Which paths are linked is operator
//! configuration, never built in.

use crate::CategoryPath;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Linking rule consulted by the ledger after every reorder.
pub trait AliasPolicy: fmt::Debug + Send + Sync {
    /// Paths that receive the same edits as `category`.
    ///
    /// Never contains `category` itself.
    fn linked(&self, category: &CategoryPath) -> Vec<CategoryPath>;
}

/// No category is linked to any other.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAliases;

impl AliasPolicy for NoAliases {
    fn linked(&self, _category: &CategoryPath) -> Vec<CategoryPath> {
        Vec::new()
    }
}

/// One configured rule: `category` is mirrored to every path in `linked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub category: CategoryPath,
    #[serde(default)]
    pub linked: Vec<CategoryPath>,
    /// Also mirror each linked path back to `category`.
    #[serde(default)]
    pub symmetric: bool,
}

/// Alias lookup built from configured rules.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    links: BTreeMap<CategoryPath, BTreeSet<CategoryPath>>,
}

impl AliasTable {
    #[must_use]
    pub fn new(rules: &[AliasRule]) -> Self {
        let mut links: BTreeMap<CategoryPath, BTreeSet<CategoryPath>> = BTreeMap::new();

        for rule in rules {
            for target in rule.linked.iter().filter(|t| **t != rule.category) {
                links
                    .entry(rule.category.clone())
                    .or_default()
                    .insert(target.clone());
                if rule.symmetric {
                    links
                        .entry(target.clone())
                        .or_default()
                        .insert(rule.category.clone());
                }
            }
        }

        Self { links }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl AliasPolicy for AliasTable {
    fn linked(&self, category: &CategoryPath) -> Vec<CategoryPath> {
        self.links
            .get(category)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}
