//! Device display formatting
//!
//! Formats device pages, single devices and their history for terminal
//! output.

use crate::history::HistoryEntry;
use crate::models::Device;
use crate::services::DevicePage;

fn width_of<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.chars().count())
}

/// Format one page of a device listing as a table
pub fn format_device_page(page: &DevicePage) -> String {
    if page.devices.is_empty() {
        return if page.total == 0 {
            "No devices found.".to_string()
        } else {
            format!(
                "Page {} is past the end ({} devices, {} pages).",
                page.current_page, page.total, page.total_pages
            )
        };
    }

    let devices = &page.devices;
    let name_width = width_of(devices.iter().map(|d| d.name.as_str()), "Name");
    let type_width = width_of(devices.iter().map(|d| d.device_type.as_str()), "Type");
    let status_width = width_of(devices.iter().map(|d| d.status.label()), "Status");

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<name_width$}  {:<type_width$}  {:<status_width$}  {}\n",
        "ID",
        "Name",
        "Type",
        "Status",
        "Condition",
        name_width = name_width,
        type_width = type_width,
        status_width = status_width,
    ));

    output.push_str(&format!(
        "{:-<12}  {:-<name_width$}  {:-<type_width$}  {:-<status_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        type_width = type_width,
        status_width = status_width,
    ));

    for device in devices {
        output.push_str(&format!(
            "{:<12}  {:<name_width$}  {:<type_width$}  {:<status_width$}  {}\n",
            device.id.short(),
            device.name,
            device.device_type,
            device.status.label(),
            device.condition.label(),
            name_width = name_width,
            type_width = type_width,
            status_width = status_width,
        ));
    }

    output.push_str(&format!(
        "\nPage {}/{} ({} devices)\n",
        page.current_page, page.total_pages, page.total
    ));

    output
}

/// Format a single device with every field
pub fn format_device_details(device: &Device) -> String {
    let mut output = String::new();

    output.push_str(&format!("Device: {}\n", device.name));
    output.push_str(&format!("  ID:          {}\n", device.id));
    output.push_str(&format!("  Type:        {}\n", device.device_type));
    output.push_str(&format!(
        "  Status:      {} ({})\n",
        device.status.label(),
        device.status
    ));
    output.push_str(&format!(
        "  Condition:   {} ({})\n",
        device.condition.label(),
        device.condition
    ));

    if let Some(description) = &device.description {
        output.push_str(&format!("  Description: {}\n", description));
    }
    if let Some(date) = &device.maintenance_date {
        output.push_str(&format!("  Maintenance: {}\n", date));
    }
    if let Some(date) = &device.repair_date {
        output.push_str(&format!("  Repair:      {}\n", date));
    }
    if let Some(notes) = &device.notes {
        output.push_str(&format!("  Notes:       {}\n", notes));
    }

    output.push_str(&format!(
        "  Created:     {}\n",
        device.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output
}

/// Format the history of one device, most recent first
pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history entries found.".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry.format_human_readable());
        output.push('\n');
    }
    output
}
