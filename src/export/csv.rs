//! CSV Export functionality
//!
//! Exports the device list as a spreadsheet-compatible table.

use std::io::Write;

use crate::config::settings::Settings;
use crate::error::{InventoryError, InventoryResult};
use crate::models::Device;
use crate::storage::Storage;

use super::format_date;

/// Column headings of the table export
pub const TABLE_HEADERS: [&str; 6] = [
    "Tên thiết bị",
    "Loại",
    "Trạng thái",
    "Tình trạng",
    "Mô tả",
    "Ngày tạo",
];

/// Export every device to CSV, returning the number of rows written
pub fn export_devices_csv<W: Write>(
    storage: &Storage,
    settings: &Settings,
    writer: W,
) -> InventoryResult<usize> {
    let devices = storage.devices.get_all()?;
    write_devices_csv(&devices, &settings.date_format, writer)?;
    Ok(devices.len())
}

fn write_devices_csv<W: Write>(
    devices: &[Device],
    date_format: &str,
    writer: W,
) -> InventoryResult<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    csv_writer
        .write_record(TABLE_HEADERS)
        .map_err(|e| InventoryError::Export(e.to_string()))?;

    for device in devices {
        let created = format_date(device.created_at, date_format)?;
        csv_writer
            .write_record([
                device.name.as_str(),
                device.device_type.as_str(),
                device.status.label(),
                device.condition.label(),
                device.description.as_deref().unwrap_or(""),
                created.as_str(),
            ])
            .map_err(|e| InventoryError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| InventoryError::Export(e.to_string()))?;

    Ok(())
}
