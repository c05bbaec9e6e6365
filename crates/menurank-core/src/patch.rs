//! # Patch Engine
//!
//! Writes priority edits back into the original document text.
//!
//! The document is never re-serialized. Product records are located by
//! markup scanning, the byte range of each affected priority value is
//! collected, and the replacements are spliced from the end of the text
//! backward so earlier offsets stay valid. Every other byte (whitespace,
//! attribute order, quoting, comments, unrelated records) survives as-is.
//!
//! Patching is best-effort: an edit whose entry or priority field cannot be
//! found is reported in [`PatchOutcome::skipped`] and the remaining edits
//! still apply.

use crate::formats::{encoding_for, find_close_tag, scan_tags};
use crate::primitives::{
    GENERATED_ATTR, GENERATED_FORMAT, PRODUCT_ELEMENT, PRODUCT_ID_ATTR, ROOT_ELEMENT,
    VERSION_PRIORITY_ATTR,
};
use crate::{CategoryPath, EntryId, PriorityEdit};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry as MapEntry;
use std::ops::Range;
use thiserror::Error;

// =============================================================================
// OPTIONS & OUTCOME
// =============================================================================

/// Write-back switches (`[patch]` config section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchOptions {
    /// Set the root `generated` attribute to the patch time when at least
    /// one edit applied.
    pub refresh_generated: bool,
    /// Set each touched product's `iaiext:version_priority` to its first
    /// applied priority.
    pub sync_version_priority: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            refresh_generated: true,
            sync_version_priority: false,
        }
    }
}

/// Why an edit was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no product record with this id")]
    EntryNotFound,
    #[error("product has no priority field for this path")]
    AssignmentNotFound,
}

/// An edit that was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEdit {
    pub edit: PriorityEdit,
    pub reason: SkipReason,
}

/// Result of one write-back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutcome {
    /// The patched document text.
    pub text: String,
    /// Number of (entry, path) edits written.
    pub applied: usize,
    pub skipped: Vec<SkippedEdit>,
    /// Whether the root `generated` value was rewritten.
    pub generated_refreshed: bool,
}

impl PatchOutcome {
    fn unchanged(raw: &str) -> Self {
        Self {
            text: raw.to_owned(),
            applied: 0,
            skipped: Vec::new(),
            generated_refreshed: false,
        }
    }

    /// True when every requested edit was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

// =============================================================================
// SPANS
// =============================================================================

/// A priority value located inside a product record.
#[derive(Debug)]
struct PriorityField {
    path: String,
    value: Range<usize>,
}

/// Byte ranges of product records keyed by (unescaped) id. The first record
/// wins when an id repeats, matching the parser. Records inside comments or
/// CDATA are not records.
fn product_spans(raw: &str) -> BTreeMap<String, Range<usize>> {
    let mut spans = BTreeMap::new();

    for tag in scan_tags(raw, 0).filter(|t| t.name == PRODUCT_ELEMENT) {
        let Some(id) = tag.attribute(PRODUCT_ID_ATTR) else {
            continue;
        };
        let end = if tag.self_closing {
            tag.end
        } else {
            match find_close_tag(&raw[tag.end..], tag.end, PRODUCT_ELEMENT) {
                Some(end) => end,
                None => continue,
            }
        };
        if let MapEntry::Vacant(slot) = spans.entry(id.value().into_owned()) {
            slot.insert(tag.start..end);
        }
    }

    spans
}

/// Every priority-bearing element inside `span` that carries a value.
fn priority_fields(raw: &str, span: &Range<usize>) -> Vec<PriorityField> {
    scan_tags(&raw[span.clone()], span.start)
        .filter_map(|tag| {
            let encoding = encoding_for(tag.name)?;
            let path = tag.attribute(encoding.path_attr)?;
            let priority = tag.attribute(encoding.priority_attr)?;
            Some(PriorityField {
                path: path.value().into_owned(),
                value: priority.value_start..priority.value_end,
            })
        })
        .collect()
}

/// Collapse repeated (entry, path) edits; the last value wins, the first
/// position is kept.
fn collapse(edits: &[PriorityEdit]) -> Vec<PriorityEdit> {
    let mut index: BTreeMap<(&EntryId, &CategoryPath), usize> = BTreeMap::new();
    let mut collapsed: Vec<PriorityEdit> = Vec::with_capacity(edits.len());

    for edit in edits {
        match index.entry((&edit.entry, &edit.path)) {
            MapEntry::Occupied(slot) => collapsed[*slot.get()].priority = edit.priority,
            MapEntry::Vacant(slot) => {
                slot.insert(collapsed.len());
                collapsed.push(edit.clone());
            }
        }
    }

    collapsed
}

// =============================================================================
// ENGINE
// =============================================================================

/// Span-preserving write-back of priority edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchEngine {
    options: PatchOptions,
}

impl PatchEngine {
    #[must_use]
    pub fn new(options: PatchOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> PatchOptions {
        self.options
    }

    /// Patch `raw` with `edits`, stamping the local time.
    #[must_use]
    pub fn patch(&self, raw: &str, edits: &[PriorityEdit]) -> PatchOutcome {
        self.patch_at(raw, edits, Local::now().naive_local())
    }

    /// Patch `raw` with `edits`, stamping `now`.
    ///
    /// With no edits the output is byte-identical to the input.
    #[must_use]
    pub fn patch_at(&self, raw: &str, edits: &[PriorityEdit], now: NaiveDateTime) -> PatchOutcome {
        if edits.is_empty() {
            return PatchOutcome::unchanged(raw);
        }

        let collapsed = collapse(edits);
        let spans = product_spans(raw);
        let mut fields: BTreeMap<&str, Vec<PriorityField>> = BTreeMap::new();
        let mut first_applied: BTreeMap<&str, i64> = BTreeMap::new();
        let mut replacements: Vec<(Range<usize>, String)> = Vec::new();
        let mut skipped = Vec::new();
        let mut applied = 0usize;

        for edit in &collapsed {
            let id = edit.entry.as_str();
            let Some(span) = spans.get(id) else {
                tracing::warn!(entry = %edit.entry, path = %edit.path, "Skipping edit: entry not found");
                skipped.push(SkippedEdit {
                    edit: edit.clone(),
                    reason: SkipReason::EntryNotFound,
                });
                continue;
            };

            let entry_fields = fields
                .entry(id)
                .or_insert_with(|| priority_fields(raw, span));
            let value = edit.priority.to_string();
            let before = replacements.len();
            replacements.extend(
                entry_fields
                    .iter()
                    .filter(|f| f.path == edit.path.as_str())
                    .map(|f| (f.value.clone(), value.clone())),
            );

            if replacements.len() == before {
                tracing::warn!(entry = %edit.entry, path = %edit.path, "Skipping edit: no priority field for path");
                skipped.push(SkippedEdit {
                    edit: edit.clone(),
                    reason: SkipReason::AssignmentNotFound,
                });
                continue;
            }

            applied += 1;
            first_applied.entry(id).or_insert(edit.priority);
        }

        if self.options.sync_version_priority {
            for (id, priority) in &first_applied {
                let Some(span) = spans.get(*id) else {
                    continue;
                };
                let start_tag = scan_tags(&raw[span.clone()], span.start).next();
                if let Some(attr) = start_tag.and_then(|t| t.attribute(VERSION_PRIORITY_ATTR)) {
                    replacements.push((attr.value_start..attr.value_end, priority.to_string()));
                }
            }
        }

        let mut generated_refreshed = false;
        if applied > 0 && self.options.refresh_generated {
            let root = scan_tags(raw, 0).find(|t| t.name == ROOT_ELEMENT);
            if let Some(attr) = root.and_then(|t| t.attribute(GENERATED_ATTR)) {
                replacements.push((
                    attr.value_start..attr.value_end,
                    now.format(GENERATED_FORMAT).to_string(),
                ));
                generated_refreshed = true;
            }
        }

        let text = splice(raw, replacements);
        tracing::debug!(
            requested = edits.len(),
            applied,
            skipped = skipped.len(),
            generated_refreshed,
            "Patched document"
        );

        PatchOutcome {
            text,
            applied,
            skipped,
            generated_refreshed,
        }
    }
}

/// Apply non-overlapping replacements from the highest offset down.
fn splice(raw: &str, mut replacements: Vec<(Range<usize>, String)>) -> String {
    replacements.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    replacements.dedup_by(|later, earlier| later.0 == earlier.0);

    let mut text = raw.to_owned();
    for (range, value) in replacements {
        text.replace_range(range, &value);
    }
    text
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const DOC: &str = r#"<offer generated="2024-05-01 10:00:00">
  <products>
    <product id="1" iaiext:version_priority="0">
      <item textId="X" level="5"/>
      <item textId="Y"   level='7' />
    </product>
    <product id="2"><item textId="X" level="5"/></product>
    <product id="3"><iaiext:item textid="X\Sub" iaiext:priority_menu="5"><iaiext:node_path_translation name="X" iaiext:priority_menu="4"/></iaiext:item></product>
  </products>
</offer>"#;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .expect("valid timestamp")
    }

    fn edit(entry: &str, path: &str, priority: i64) -> PriorityEdit {
        PriorityEdit::new(EntryId::from(entry), CategoryPath::from(path), priority)
    }

    #[test]
    fn no_edits_is_identity() {
        let out = PatchEngine::default().patch(DOC, &[]);
        assert_eq!(out.text, DOC);
        assert_eq!(out.applied, 0);
        assert!(!out.generated_refreshed);
    }

    #[test]
    fn rewrites_only_the_value() {
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            sync_version_priority: false,
        });
        let out = engine.patch_at(DOC, &[edit("1", "Y", 42)], at());
        assert_eq!(out.applied, 1);
        assert_eq!(out.text, DOC.replace("level='7'", "level='42'"));
    }

    #[test]
    fn same_path_in_other_products_is_untouched() {
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            ..PatchOptions::default()
        });
        let out = engine.patch_at(DOC, &[edit("2", "X", 9)], at());
        assert!(out.text.contains(r#"<product id="2"><item textId="X" level="9"/>"#));
        assert!(out.text.contains(r#"<item textId="X" level="5"/>"#));
    }

    #[test]
    fn declaration_elements_are_patched() {
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            ..PatchOptions::default()
        });
        let out = engine.patch_at(DOC, &[edit("3", "X", 11), edit("3", "X\\Sub", 12)], at());
        assert_eq!(out.applied, 2);
        assert!(out.text.contains(r#"name="X" iaiext:priority_menu="11""#));
        assert!(out.text.contains(r#"textid="X\Sub" iaiext:priority_menu="12""#));
    }

    #[test]
    fn misses_are_reported_and_rest_applies() {
        let out = PatchEngine::default().patch_at(
            DOC,
            &[edit("404", "X", 1), edit("2", "X", 3), edit("2", "Nope", 1)],
            at(),
        );
        assert_eq!(out.applied, 1);
        let reasons: Vec<_> = out.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(
            reasons,
            vec![SkipReason::EntryNotFound, SkipReason::AssignmentNotFound]
        );
        assert!(!out.is_complete());
    }

    #[test]
    fn generated_refreshes_only_when_something_applied() {
        let engine = PatchEngine::default();

        let out = engine.patch_at(DOC, &[edit("2", "X", 3)], at());
        assert!(out.generated_refreshed);
        assert!(out.text.starts_with(r#"<offer generated="2025-01-02 03:04:05">"#));

        let out = engine.patch_at(DOC, &[edit("404", "X", 3)], at());
        assert!(!out.generated_refreshed);
        assert_eq!(out.text, DOC);
    }

    #[test]
    fn duplicate_edits_last_wins() {
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            ..PatchOptions::default()
        });
        let out = engine.patch_at(DOC, &[edit("2", "X", 3), edit("2", "X", 8)], at());
        assert_eq!(out.applied, 1);
        assert!(out.text.contains(r#"<product id="2"><item textId="X" level="8"/>"#));
    }

    #[test]
    fn version_priority_sync_is_opt_in() {
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            sync_version_priority: true,
        });
        let out = engine.patch_at(DOC, &[edit("1", "X", 30), edit("1", "Y", 20)], at());
        assert!(out.text.contains(r#"iaiext:version_priority="30""#));

        let out = PatchEngine::default().patch_at(DOC, &[edit("1", "X", 30)], at());
        assert!(out.text.contains(r#"iaiext:version_priority="0""#));
    }

    #[test]
    fn escaped_ids_and_paths_match_unescaped() {
        let raw = r#"<offer><products><product id="a&amp;b"><item textId="K &amp; P" level="1"/></product></products></offer>"#;
        let out = PatchEngine::default().patch(raw, &[edit("a&b", "K & P", 2)]);
        assert_eq!(out.applied, 1);
        assert!(out.text.contains(r#"level="2""#));
    }

    #[test]
    fn commented_out_copy_is_not_patched() {
        let raw = r#"<offer><products><!-- old: <product id="1"><item textId="X" level="1"/></product> --><product id="1"><item textId="X" level="4"/><!-- </product> --></product></products></offer>"#;
        let engine = PatchEngine::new(PatchOptions {
            refresh_generated: false,
            ..PatchOptions::default()
        });
        let out = engine.patch_at(raw, &[edit("1", "X", 99)], at());

        let parsed = crate::Document::parse(raw).expect("parse");
        let entry = parsed.entry(&EntryId::from("1")).expect("entry");
        assert_eq!(entry.priority_in(&CategoryPath::from("X")), Some(4));

        assert_eq!(out.applied, 1);
        assert!(out.is_complete());
        assert_eq!(
            out.text,
            raw.replace(r#"level="4""#, r#"level="99""#)
        );
    }

    #[test]
    fn product_only_in_comment_is_a_miss() {
        let raw = r#"<offer><products><!-- <product id="7"><item textId="X" level="1"/></product> --></products></offer>"#;
        let out = PatchEngine::default().patch(raw, &[edit("7", "X", 5)]);
        assert_eq!(out.applied, 0);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].reason, SkipReason::EntryNotFound);
        assert_eq!(out.text, raw);
    }

    #[test]
    fn self_closing_product_has_no_fields() {
        let raw = r#"<offer><products><product id="1"/><product id="2"><item textId="X" level="1"/></product></products></offer>"#;
        let out = PatchEngine::default().patch(raw, &[edit("1", "X", 5)]);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].reason, SkipReason::AssignmentNotFound);
    }
}
