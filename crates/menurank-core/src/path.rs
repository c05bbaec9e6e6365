//! # Path Expander
//!
//! Turns a hierarchical category identifier into the ordered list of its
//! prefixes. An entry attached to `A\B\C` is ranked independently under
//! `A`, `A\B` and `A\B\C`.
//!
//! - Never fails: a missing identifier contributes no paths
//! - Empty segments (`A\\B`, leading or trailing `\`) are ignored
//! - Deduplication keeps the first occurrence

use crate::CategoryPath;
use crate::primitives::PATH_DELIMITER;
use std::collections::BTreeSet;

/// Stateless prefix expansion for category paths.
pub struct PathExpander;

impl PathExpander {
    /// Expand one identifier into its non-empty prefixes, shortest first.
    ///
    /// `A\B\C` becomes `[A, A\B, A\B\C]`; a single-segment path returns a
    /// one-element list containing itself.
    #[must_use]
    pub fn expand(raw: &str) -> Vec<CategoryPath> {
        let mut prefixes = Vec::new();
        let mut current = String::with_capacity(raw.len());

        for segment in raw.split(PATH_DELIMITER).filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push(PATH_DELIMITER);
            }
            current.push_str(segment);
            prefixes.push(CategoryPath::new(current.clone()));
        }

        prefixes
    }

    /// Expand several physical attachments of one entry.
    ///
    /// `None` attachments are skipped. Prefixes shared between attachments
    /// are kept once, at the position of their first occurrence.
    #[must_use]
    pub fn expand_all<'a, I>(raw_paths: I) -> Vec<CategoryPath>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut seen = BTreeSet::new();
        let mut expanded = Vec::new();

        for raw in raw_paths.into_iter().flatten() {
            for prefix in Self::expand(raw) {
                if seen.insert(prefix.clone()) {
                    expanded.push(prefix);
                }
            }
        }

        expanded
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(paths: &[CategoryPath]) -> Vec<&str> {
        paths.iter().map(CategoryPath::as_str).collect()
    }

    #[test]
    fn expand_three_segments() {
        let paths = PathExpander::expand("A\\B\\C");
        assert_eq!(strs(&paths), vec!["A", "A\\B", "A\\B\\C"]);
    }

    #[test]
    fn expand_single_segment_is_identity() {
        let paths = PathExpander::expand("SKLEP");
        assert_eq!(strs(&paths), vec!["SKLEP"]);
        assert_eq!(PathExpander::expand(paths[0].as_str()), paths);
    }

    #[test]
    fn expand_ignores_empty_segments() {
        let paths = PathExpander::expand("\\A\\\\B\\");
        assert_eq!(strs(&paths), vec!["A", "A\\B"]);
        assert!(PathExpander::expand("").is_empty());
    }

    #[test]
    fn expand_keeps_spaces_and_unicode() {
        let paths = PathExpander::expand("SKLEP\\Kurtki i Płaszcze");
        assert_eq!(strs(&paths), vec!["SKLEP", "SKLEP\\Kurtki i Płaszcze"]);
    }

    #[test]
    fn expand_all_deduplicates_overlapping_prefixes() {
        let paths = PathExpander::expand_all([
            Some("SKLEP\\Kurtki\\Zimowe"),
            None,
            Some("SKLEP\\Kurtki\\Wiosenne"),
            Some("SKLEP"),
        ]);
        assert_eq!(
            strs(&paths),
            vec![
                "SKLEP",
                "SKLEP\\Kurtki",
                "SKLEP\\Kurtki\\Zimowe",
                "SKLEP\\Kurtki\\Wiosenne",
            ]
        );
    }
}
