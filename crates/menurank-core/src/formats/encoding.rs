//! # Priority Encodings
//!
//! Export documents spell a (category path, priority) pair in more than one
//! way. Each spelling is one row of [`PRIORITY_ENCODINGS`]; both the parser
//! and the patch engine read the same table so they always agree on what a
//! priority field is.

/// What a priority-bearing element means for its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingRole {
    /// Attaches the entry to a leaf path; the path is expanded into prefixes.
    Attachment,
    /// Declares a priority for a path without attaching the entry to it.
    Declaration,
}

/// One spelling of a priority field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityEncoding {
    /// Qualified element name, exactly as written in the document.
    pub element: &'static str,
    /// Attribute holding the category path.
    pub path_attr: &'static str,
    /// Attribute holding the integer priority.
    pub priority_attr: &'static str,
    pub role: EncodingRole,
}

/// All priority-bearing element spellings, in lookup order.
pub const PRIORITY_ENCODINGS: [PriorityEncoding; 3] = [
    PriorityEncoding {
        element: "iaiext:item",
        path_attr: "textid",
        priority_attr: "iaiext:priority_menu",
        role: EncodingRole::Attachment,
    },
    PriorityEncoding {
        element: "item",
        path_attr: "textId",
        priority_attr: "level",
        role: EncodingRole::Attachment,
    },
    PriorityEncoding {
        element: "iaiext:node_path_translation",
        path_attr: "name",
        priority_attr: "iaiext:priority_menu",
        role: EncodingRole::Declaration,
    },
];

/// Look up the encoding for a qualified element name.
#[must_use]
pub fn encoding_for(element: &str) -> Option<&'static PriorityEncoding> {
    PRIORITY_ENCODINGS.iter().find(|e| e.element == element)
}
