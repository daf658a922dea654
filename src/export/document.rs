//! Printable document export
//!
//! Renders the device list as a plain-text report: a title, the date it was
//! produced and a bordered table.

use std::io::Write;

use chrono::{DateTime, Utc};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::config::settings::Settings;
use crate::error::{InventoryError, InventoryResult};
use crate::models::Device;
use crate::storage::Storage;

use super::format_date;

/// Column headings of the document export
pub const DOCUMENT_HEADERS: [&str; 5] = ["Tên thiết bị", "Loại", "Trạng thái", "Tình trạng", "Mô tả"];

/// Export every device as a printable document, returning the device count
pub fn export_devices_document<W: Write>(
    storage: &Storage,
    settings: &Settings,
    writer: &mut W,
) -> InventoryResult<usize> {
    let devices = storage.devices.get_all()?;
    let document = render_document(&devices, settings, Utc::now())?;

    writer
        .write_all(document.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| InventoryError::Export(format!("Failed to write document: {}", e)))?;

    Ok(devices.len())
}

/// Build the document text for `devices` as of `generated_at`
pub fn render_document(
    devices: &[Device],
    settings: &Settings,
    generated_at: DateTime<Utc>,
) -> InventoryResult<String> {
    let mut builder = Builder::default();
    builder.push_record(DOCUMENT_HEADERS);

    for device in devices {
        builder.push_record([
            device.name.as_str(),
            device.device_type.as_str(),
            device.status.label(),
            device.condition.label(),
            device.description.as_deref().unwrap_or(""),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern());

    let mut output = String::new();
    output.push_str(&settings.document_title.to_uppercase());
    output.push('\n');
    output.push_str(&format!(
        "Ngày xuất: {}\n",
        format_date(generated_at, &settings.date_format)?
    ));
    output.push_str(&format!("Tổng số thiết bị: {}\n\n", devices.len()));
    output.push_str(&table.to_string());
    output.push('\n');

    Ok(output)
}
