//! # Markup Scanning
//!
//! Locates start tags and attribute values by byte offset without building
//! a tree. The patch engine rewrites the returned ranges in place, so every
//! byte outside them survives untouched.
//!
//! Attribute values are matched as quoted strings, so a `>` inside a value
//! does not end the tag. Comments, CDATA sections and processing
//! instructions are opaque: no tag inside them is reported, which keeps the
//! scanner in step with the XML reader.

use quick_xml::escape::unescape;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

static OPAQUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?(?:-->|\z)|<!\[CDATA\[.*?(?:\]\]>|\z)|<\?.*?(?:\?>|\z)")
        .expect("opaque section pattern is valid")
});

static CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</([A-Za-z_][\w.:\-]*)\s*>").expect("closing tag pattern is valid")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([A-Za-z_][\w.:\-]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#,
    )
    .expect("start tag pattern is valid")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
});

/// A start (or empty-element) tag located in a larger text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan<'a> {
    /// Qualified element name.
    pub name: &'a str,
    /// Absolute offset of `<`.
    pub start: usize,
    /// Absolute offset one past `>`.
    pub end: usize,
    pub self_closing: bool,
    attrs: &'a str,
    attrs_offset: usize,
}

/// An attribute whose value range is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSpan<'a> {
    pub name: &'a str,
    /// Value exactly as written (still escaped, without quotes).
    pub raw_value: &'a str,
    /// Absolute offset of the first value byte.
    pub value_start: usize,
    /// Absolute offset one past the last value byte.
    pub value_end: usize,
}

impl<'a> TagSpan<'a> {
    /// Attributes of this tag, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = AttrSpan<'a>> + use<'a> {
        let offset = self.attrs_offset;
        ATTR_RE
            .captures_iter(self.attrs)
            .filter_map(move |caps| attr_span(&caps, offset))
    }

    /// First attribute named `name` (qualified, case-sensitive).
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttrSpan<'a>> {
        self.attributes().find(|a| a.name == name)
    }
}

impl AttrSpan<'_> {
    /// Value with XML entities resolved.
    #[must_use]
    pub fn value(&self) -> Cow<'_, str> {
        unescape_value(self.raw_value)
    }
}

fn attr_span<'a>(caps: &Captures<'a>, offset: usize) -> Option<AttrSpan<'a>> {
    let name = caps.get(1)?;
    let value = caps.get(2).or_else(|| caps.get(3))?;
    Some(AttrSpan {
        name: name.as_str(),
        raw_value: value.as_str(),
        value_start: offset + value.start(),
        value_end: offset + value.end(),
    })
}

/// Ranges of `text` that lie outside comments, CDATA and processing
/// instructions. An unterminated section runs to the end of the text.
fn markup_segments(text: &str) -> Vec<Range<usize>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for opaque in OPAQUE_RE.find_iter(text) {
        if opaque.start() > cursor {
            segments.push(cursor..opaque.start());
        }
        cursor = opaque.end();
    }
    if cursor < text.len() {
        segments.push(cursor..text.len());
    }
    segments
}

fn tag_span<'a>(caps: &Captures<'a>, offset: usize) -> Option<TagSpan<'a>> {
    let whole = caps.get(0)?;
    let name = caps.get(1)?;
    let attrs = caps.get(2)?;
    Some(TagSpan {
        name: name.as_str(),
        start: offset + whole.start(),
        end: offset + whole.end(),
        self_closing: caps.get(3).is_some_and(|m| !m.as_str().is_empty()),
        attrs: attrs.as_str(),
        attrs_offset: offset + attrs.start(),
    })
}

/// Scan `text` for start tags; offsets are reported relative to `base`.
pub fn scan_tags<'a>(text: &'a str, base: usize) -> impl Iterator<Item = TagSpan<'a>> + 'a {
    markup_segments(text).into_iter().flat_map(move |segment| {
        let offset = base + segment.start;
        let slice: &'a str = &text[segment];
        TAG_RE
            .captures_iter(slice)
            .filter_map(move |caps| tag_span(&caps, offset))
    })
}

/// Offset (relative to `base`) one past the first `</name>` in `text`.
#[must_use]
pub fn find_close_tag(text: &str, base: usize, name: &str) -> Option<usize> {
    markup_segments(text).into_iter().find_map(|segment| {
        let offset = base + segment.start;
        CLOSE_RE
            .captures_iter(&text[segment])
            .find(|caps| caps.get(1).is_some_and(|m| m.as_str() == name))
            .and_then(|caps| caps.get(0))
            .map(|whole| offset + whole.end())
    })
}

/// Resolve XML entities in an attribute value.
///
/// Values with an unknown entity are compared as written.
#[must_use]
pub fn unescape_value(raw: &str) -> Cow<'_, str> {
    unescape(raw).unwrap_or(Cow::Borrowed(raw))
}

// =============================================================================
// TESTS
// =============================================================================
