//! Export module for the inventory
//!
//! Read-only projections of the whole device store, oldest first:
//! - CSV: the spreadsheet table, one row per device
//! - Document: a printable plain-text report with a title and a bordered table

pub mod csv;
pub mod document;

pub use self::csv::{export_devices_csv, TABLE_HEADERS};
pub use document::{export_devices_document, render_document, DOCUMENT_HEADERS};

use chrono::{DateTime, Local, Utc};
use chrono::format::{Item, StrftimeItems};

use crate::error::{InventoryError, InventoryResult};

/// Render a timestamp in local time with a strftime pattern
///
/// An unknown specifier in `pattern` is an `Export` error rather than a panic
/// while formatting.
pub fn format_date(at: DateTime<Utc>, pattern: &str) -> InventoryResult<String> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(InventoryError::Export(format!(
            "Invalid date format '{}'",
            pattern
        )));
    }

    Ok(at.with_timezone(&Local).format(pattern).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        let formatted = format_date(Utc::now(), "%d/%m/%Y").unwrap();
        assert_eq!(formatted.len(), 10);
        assert_eq!(formatted.matches('/').count(), 2);
    }

    #[test]
    fn test_invalid_format_is_an_error() {
        let result = format_date(Utc::now(), "%Q");
        assert!(matches!(result, Err(InventoryError::Export(_))));
    }
}
