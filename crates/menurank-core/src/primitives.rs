//! # Primitives
//!
//! Fixed constants of the document format and of the ranking rules.
//!
//! Values that operators may want to change (priority base, alias rules,
//! patch switches) have defaults here but are overridable through
//! `ledger::LedgerConfig` and `patch::PatchOptions`.

/// Segment delimiter of hierarchical category paths.
pub const PATH_DELIMITER: char = '\\';

/// Value an `Undeclared` priority reads as.
pub const UNDECLARED_PRIORITY: i64 = 0;

/// Default base of a reorder: the first position receives this priority,
/// each following position one less.
pub const DEFAULT_PRIORITY_BASE: i64 = 1000;

/// Root element of an export document.
pub const ROOT_ELEMENT: &str = "offer";

/// Container of product records (direct child of the root).
pub const PRODUCTS_ELEMENT: &str = "products";

/// One product record.
pub const PRODUCT_ELEMENT: &str = "product";

/// Attribute holding the product id.
pub const PRODUCT_ID_ATTR: &str = "id";

/// Attribute holding the secondary code shown on the product card.
pub const PRODUCT_CODE_ATTR: &str = "code_on_card";

/// Product-level priority attribute, optionally kept in sync on write-back.
pub const VERSION_PRIORITY_ATTR: &str = "iaiext:version_priority";

/// Element whose `url` attribute (or `url` child) references the icon.
pub const ICON_ELEMENT: &str = "icon";

/// Attribute / child element carrying the icon URL.
pub const ICON_URL: &str = "url";

/// Root attribute refreshed with the write-back time.
pub const GENERATED_ATTR: &str = "generated";

/// Format of the `generated` timestamp.
pub const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Attribute carrying a remote menu-node id on priority-bearing elements.
pub const NODE_ID_ATTR: &str = "id";

/// File name offered for the re-emitted document.
pub const DOWNLOAD_FILENAME: &str = "updated_products.xml";

/// Maximum accepted document size (64 MiB).
pub const MAX_DOCUMENT_SIZE: usize = 64 * 1024 * 1024;

/// Maximum number of ids accepted in one reorder request.
pub const MAX_ORDER_LENGTH: usize = 10_000;

/// Default shop id used in gateway updates.
pub const DEFAULT_SHOP_ID: u32 = 1;

/// Default menu tree id used in gateway updates.
pub const DEFAULT_TREE_ID: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_is_backslash() {
        assert_eq!(PATH_DELIMITER, '\\');
    }

    #[test]
    fn download_name_is_xml() {
        assert!(DOWNLOAD_FILENAME.ends_with(".xml"));
    }
}
