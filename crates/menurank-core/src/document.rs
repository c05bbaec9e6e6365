//! # Document Parser
//!
//! Reads an export document into typed [`Entry`] records while keeping the
//! raw text untouched for later write-back.
//!
//! Expected shape:
//!
//! ```text
//! <offer generated="…">
//!   <products>
//!     <product id="…" code_on_card="…">
//!       <images><icons><icon url="…"/></icons></images>
//!       … priority-bearing elements (see formats::encoding) …
//!     </product>
//!   </products>
//! </offer>
//! ```
//!
//! - Product records are always read as a sequence, whatever their count
//! - Records without an id or without any menu assignment are dropped
//! - Any structural problem fails the whole parse; nothing is half-built

use crate::formats::{EncodingRole, encoding_for, unescape_value};
use crate::path::PathExpander;
use crate::primitives::{
    GENERATED_ATTR, ICON_ELEMENT, ICON_URL, MAX_DOCUMENT_SIZE, NODE_ID_ATTR, PRODUCT_CODE_ATTR,
    PRODUCT_ELEMENT, PRODUCT_ID_ATTR, PRODUCTS_ELEMENT, ROOT_ELEMENT, VERSION_PRIORITY_ATTR,
};
use crate::{AssignedPriority, CategoryPath, Entry, EntryId, MenuAssignment, MenuRankError};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::collections::BTreeSet;

// =============================================================================
// DOCUMENT
// =============================================================================

/// A loaded export document: retained raw text plus the derived entries.
#[derive(Debug, Clone)]
pub struct Document {
    raw: String,
    entries: Vec<Entry>,
    categories: Vec<CategoryPath>,
    generated: Option<String>,
}

impl Document {
    /// Parse raw document text.
    ///
    /// # Errors
    /// Returns `MenuRankError::Structure` when the text is not well-formed
    /// XML, the root is not `<offer>`, or `<products>` is missing.
    pub fn parse(raw: impl Into<String>) -> Result<Self, MenuRankError> {
        let raw = raw.into();
        if raw.len() > MAX_DOCUMENT_SIZE {
            return Err(MenuRankError::Structure(format!(
                "document size {} bytes exceeds maximum {} bytes",
                raw.len(),
                MAX_DOCUMENT_SIZE
            )));
        }

        let shape = read_shape(&raw)?;
        let record_count = shape.records.len();

        let mut seen = BTreeSet::new();
        let mut entries = Vec::with_capacity(record_count);
        for record in shape.records {
            let Some(entry) = build_entry(record) else {
                continue;
            };
            if !seen.insert(entry.id.clone()) {
                tracing::warn!(entry = %entry.id, "Duplicate product id; keeping the first record");
                continue;
            }
            entries.push(entry);
        }

        let categories: BTreeSet<CategoryPath> = entries
            .iter()
            .flat_map(|e| e.assignments.iter().map(|a| a.path.clone()))
            .collect();

        tracing::debug!(
            records = record_count,
            entries = entries.len(),
            categories = categories.len(),
            "Parsed export document"
        );

        Ok(Self {
            raw,
            entries,
            categories: categories.into_iter().collect(),
            generated: shape.generated,
        })
    }

    /// The document text exactly as loaded.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Entries that carry at least one menu assignment, in document order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }

    /// Sorted, deduplicated union of all assignment paths.
    #[must_use]
    pub fn categories(&self) -> &[CategoryPath] {
        &self.categories
    }

    /// Check whether `category` occurs in the document.
    #[must_use]
    pub fn has_category(&self, category: &CategoryPath) -> bool {
        self.categories.binary_search(category).is_ok()
    }

    /// Number of entries ranked under `category`.
    #[must_use]
    pub fn count_in(&self, category: &CategoryPath) -> usize {
        self.entries.iter().filter(|e| e.has_path(category)).count()
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Value of the root `generated` attribute, if present.
    #[must_use]
    pub fn generated(&self) -> Option<&str> {
        self.generated.as_deref()
    }
}

// =============================================================================
// RAW SHAPE
// =============================================================================

/// A priority-bearing element as written, before interpretation.
#[derive(Debug, Default)]
struct RawField {
    role: Option<EncodingRole>,
    path: Option<String>,
    priority: Option<String>,
    node_id: Option<String>,
}

#[derive(Debug, Default)]
struct RawRecord {
    id: Option<String>,
    code: Option<String>,
    version_priority: Option<String>,
    icon: Option<String>,
    fields: Vec<RawField>,
}

#[derive(Debug, Default)]
struct RawShape {
    generated: Option<String>,
    records: Vec<RawRecord>,
}

fn structure(msg: impl Into<String>) -> MenuRankError {
    MenuRankError::Structure(msg.into())
}

fn element_name(bytes: &[u8]) -> Result<String, MenuRankError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| structure(format!("element name is not UTF-8: {}", e)))
}

/// Decoded attributes of a start tag, in document order.
fn read_attributes(start: &BytesStart<'_>) -> Result<Vec<(String, String)>, MenuRankError> {
    start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| structure(format!("bad attribute: {}", e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| structure(format!("attribute name is not UTF-8: {}", e)))?;
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| structure(format!("attribute value is not UTF-8: {}", e)))?;
            Ok((key.to_owned(), unescape_value(value).into_owned()))
        })
        .collect()
}

fn take_attr(attrs: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let pos = attrs.iter().position(|(k, _)| k == name)?;
    Some(attrs.swap_remove(pos).1)
}

/// Event-driven reader that collects product records.
struct ShapeReader {
    shape: RawShape,
    stack: Vec<String>,
    saw_root: bool,
    saw_products: bool,
    current: Option<RawRecord>,
    icon_text: Option<String>,
}

impl ShapeReader {
    fn new() -> Self {
        Self {
            shape: RawShape::default(),
            stack: Vec::new(),
            saw_root: false,
            saw_products: false,
            current: None,
            icon_text: None,
        }
    }

    fn in_products(&self) -> bool {
        self.stack.len() == 2 && self.stack[0] == ROOT_ELEMENT && self.stack[1] == PRODUCTS_ELEMENT
    }

    fn open(&mut self, name: &str, start: &BytesStart<'_>) -> Result<(), MenuRankError> {
        match self.stack.len() {
            0 => {
                if self.saw_root {
                    return Err(structure(format!("unexpected second root element <{}>", name)));
                }
                if name != ROOT_ELEMENT {
                    return Err(structure(format!("root element is <{}>", name)));
                }
                self.saw_root = true;
                let mut attrs = read_attributes(start)?;
                self.shape.generated = take_attr(&mut attrs, GENERATED_ATTR);
            }
            1 if name == PRODUCTS_ELEMENT => self.saw_products = true,
            2 if self.in_products() && name == PRODUCT_ELEMENT => {
                let mut attrs = read_attributes(start)?;
                self.current = Some(RawRecord {
                    id: take_attr(&mut attrs, PRODUCT_ID_ATTR),
                    code: take_attr(&mut attrs, PRODUCT_CODE_ATTR),
                    version_priority: take_attr(&mut attrs, VERSION_PRIORITY_ATTR),
                    ..RawRecord::default()
                });
            }
            _ => self.open_inside_record(name, start)?,
        }
        Ok(())
    }

    fn open_inside_record(&mut self, name: &str, start: &BytesStart<'_>) -> Result<(), MenuRankError> {
        let parent_is_icon = self.stack.last().is_some_and(|p| p == ICON_ELEMENT);
        let Some(record) = self.current.as_mut() else {
            return Ok(());
        };

        if let Some(encoding) = encoding_for(name) {
            let mut attrs = read_attributes(start)?;
            record.fields.push(RawField {
                role: Some(encoding.role),
                path: take_attr(&mut attrs, encoding.path_attr),
                priority: take_attr(&mut attrs, encoding.priority_attr),
                node_id: take_attr(&mut attrs, NODE_ID_ATTR),
            });
        } else if name == ICON_ELEMENT && record.icon.is_none() {
            let mut attrs = read_attributes(start)?;
            record.icon = take_attr(&mut attrs, ICON_URL).filter(|u| !u.trim().is_empty());
        } else if name == ICON_URL && parent_is_icon && record.icon.is_none() {
            self.icon_text = Some(String::new());
        }
        Ok(())
    }

    fn close(&mut self, name: &str) {
        if name == ICON_URL {
            if let (Some(text), Some(record)) = (self.icon_text.take(), self.current.as_mut()) {
                let text = text.trim();
                if !text.is_empty() && record.icon.is_none() {
                    record.icon = Some(text.to_owned());
                }
            }
        }
        if name == PRODUCT_ELEMENT && self.in_products() {
            if let Some(record) = self.current.take() {
                self.shape.records.push(record);
            }
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(buf) = self.icon_text.as_mut() {
            buf.push_str(&unescape_value(text));
        }
    }

    /// Entity or character reference inside collected text. Unknown
    /// entities are kept as written.
    fn reference(&mut self, reference: &BytesRef<'_>) -> Result<(), MenuRankError> {
        let Some(buf) = self.icon_text.as_mut() else {
            return Ok(());
        };
        let resolved = reference
            .resolve_char_ref()
            .map_err(|e| structure(format!("bad character reference: {}", e)))?;
        if let Some(ch) = resolved {
            buf.push(ch);
            return Ok(());
        }
        let name = reference
            .decode()
            .map_err(|e| structure(format!("reference is not UTF-8: {}", e)))?;
        match resolve_predefined_entity(&name) {
            Some(text) => buf.push_str(text),
            None => {
                buf.push('&');
                buf.push_str(&name);
                buf.push(';');
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<RawShape, MenuRankError> {
        if !self.saw_root {
            return Err(structure("document has no root element"));
        }
        if let Some(open) = self.stack.last() {
            return Err(structure(format!("document ends inside <{}>", open)));
        }
        if !self.saw_products {
            return Err(structure(format!(
                "<{}> has no <{}> element",
                ROOT_ELEMENT, PRODUCTS_ELEMENT
            )));
        }
        Ok(self.shape)
    }
}

fn read_shape(raw: &str) -> Result<RawShape, MenuRankError> {
    let mut reader = Reader::from_str(raw);
    let mut state = ShapeReader::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            structure(format!(
                "malformed XML at byte {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(start) => {
                let name = element_name(start.name().as_ref())?;
                state.open(&name, &start)?;
                state.stack.push(name);
            }
            Event::Empty(start) => {
                let name = element_name(start.name().as_ref())?;
                state.open(&name, &start)?;
                state.stack.push(name);
                if let Some(name) = state.stack.pop() {
                    state.close(&name);
                }
            }
            Event::End(end) => {
                let name = element_name(end.name().as_ref())?;
                match state.stack.last() {
                    Some(open) if *open == name => {}
                    Some(open) => {
                        return Err(structure(format!(
                            "</{}> closes <{}>",
                            name, open
                        )));
                    }
                    None => return Err(structure(format!("unmatched </{}>", name))),
                }
                state.stack.pop();
                state.close(&name);
            }
            Event::Text(text) => {
                let text = std::str::from_utf8(&text)
                    .map_err(|e| structure(format!("text is not UTF-8: {}", e)))?;
                state.text(text);
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|e| structure(format!("CDATA is not UTF-8: {}", e)))?;
                if let Some(buf) = state.icon_text.as_mut() {
                    buf.push_str(text);
                }
            }
            Event::GeneralRef(reference) => state.reference(&reference)?,
            Event::Eof => break,
            _ => {}
        }
    }

    state.finish()
}

// =============================================================================
// ENTRY CONSTRUCTION
// =============================================================================

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

fn build_entry(record: RawRecord) -> Option<Entry> {
    let Some(id) = record.id.filter(|id| !id.is_empty()) else {
        tracing::warn!("Product record without id dropped");
        return None;
    };

    let attachments = record
        .fields
        .iter()
        .filter(|f| f.role == Some(EncodingRole::Attachment))
        .map(|f| f.path.as_deref());

    let assignments: Vec<MenuAssignment> = PathExpander::expand_all(attachments)
        .into_iter()
        .map(|path| {
            let declaring: Vec<&RawField> = record
                .fields
                .iter()
                .filter(|f| f.path.as_deref() == Some(path.as_str()))
                .collect();
            let priority = declaring
                .iter()
                .find_map(|f| parse_int(f.priority.as_deref()))
                .map_or(AssignedPriority::Undeclared, AssignedPriority::Declared);
            let node_id = declaring
                .iter()
                .find_map(|f| f.node_id.as_deref().and_then(|n| n.trim().parse().ok()));
            MenuAssignment {
                path,
                priority,
                node_id,
            }
        })
        .collect();

    if assignments.is_empty() {
        tracing::debug!(entry = %id, "Product without menu assignments dropped");
        return None;
    }

    Some(Entry {
        id: EntryId::new(id),
        icon: record.icon,
        code: record.code,
        version_priority: parse_int(record.version_priority.as_deref()),
        assignments,
    })
}

// =============================================================================
// TESTS
// =============================================================================
