//! # Formats Module
//!
//! Knowledge about the export document's on-disk shape:
//! - `encoding`: which elements carry a (path, priority) pair
//! - `markup`: offset-preserving tag and attribute scanning

pub mod encoding;
pub mod markup;

pub use encoding::{EncodingRole, PRIORITY_ENCODINGS, PriorityEncoding, encoding_for};
pub use markup::{AttrSpan, TagSpan, find_close_tag, scan_tags, unescape_value};
