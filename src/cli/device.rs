//! Device CLI commands
//!
//! Implements CLI commands for listing, editing and auditing devices.

use chrono::NaiveDate;
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::device::{format_device_details, format_device_page, format_history};
use crate::error::{InventoryError, InventoryResult};
use crate::models::{DeviceCondition, DevicePatch, DeviceStatus, NewDevice};
use crate::services::{DeviceQuery, DeviceService, Identity};
use crate::storage::Storage;

/// Device subcommands
#[derive(Subcommand)]
pub enum DeviceCommands {
    /// List devices, newest first
    List {
        /// Text to find in the name or description
        #[arg(short, long)]
        search: Option<String>,
        /// Exact device type
        #[arg(short = 't', long = "type")]
        device_type: Option<String>,
        /// Status (active, inactive, maintenance)
        #[arg(long)]
        status: Option<String>,
        /// Condition (tốt, trung bình, kém)
        #[arg(long)]
        condition: Option<String>,
        /// Page number, starting at 1
        #[arg(short, long)]
        page: Option<String>,
        /// Devices per page
        #[arg(short, long)]
        limit: Option<String>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show device details
    Show {
        /// Device ID or name
        device: String,
    },
    /// Add a new device
    Add {
        /// Device name
        name: String,
        /// Device type, e.g. "Máy in"
        #[arg(short = 't', long = "type")]
        device_type: String,
        /// Status (default: active)
        #[arg(long)]
        status: Option<String>,
        /// Condition (default: tốt)
        #[arg(long)]
        condition: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Last maintenance date (YYYY-MM-DD)
        #[arg(long)]
        maintenance_date: Option<String>,
        /// Last repair date (YYYY-MM-DD)
        #[arg(long)]
        repair_date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Edit a device; only the given fields change
    Edit {
        /// Device ID or name
        device: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 't', long = "type")]
        device_type: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        condition: Option<String>,
        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long, conflicts_with = "clear_maintenance_date")]
        maintenance_date: Option<String>,
        #[arg(long)]
        clear_maintenance_date: bool,
        #[arg(long, conflicts_with = "clear_repair_date")]
        repair_date: Option<String>,
        #[arg(long)]
        clear_repair_date: bool,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
    },
    /// Remove a device; its history is kept
    #[command(alias = "rm")]
    Remove {
        /// Device ID or name
        device: String,
    },
    /// Show the change history of a device, including deleted ones
    History {
        /// Device ID or name
        device: String,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Handle a device command
pub fn handle_device_command(
    storage: &Storage,
    settings: &Settings,
    identity: &Identity,
    cmd: DeviceCommands,
) -> InventoryResult<()> {
    let service = DeviceService::new(storage).acting_as(identity);

    match cmd {
        DeviceCommands::List {
            search,
            device_type,
            status,
            condition,
            page,
            limit,
            json,
        } => {
            let params = [
                ("search", search),
                ("type", device_type),
                ("status", status),
                ("condition", condition),
                ("page", page),
                ("limit", limit),
            ];
            let query = DeviceQuery::from_params(
                params
                    .iter()
                    .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v))),
                settings.default_page_size,
            );

            let page = service.list(&query)?;

            if json {
                let output = serde_json::to_string_pretty(&page)?;
                println!("{}", output);
            } else {
                println!("{}", format_device_page(&page));
            }
        }

        DeviceCommands::Show { device } => {
            let id = service.resolve(&device)?;
            let device = service.get(id)?;
            print!("{}", format_device_details(&device));
        }

        DeviceCommands::Add {
            name,
            device_type,
            status,
            condition,
            description,
            maintenance_date,
            repair_date,
            notes,
        } => {
            let input = NewDevice {
                name,
                device_type,
                status: status.as_deref().map(parse_status).transpose()?,
                condition: condition.as_deref().map(parse_condition).transpose()?,
                description,
                maintenance_date: maintenance_date.as_deref().map(parse_date).transpose()?,
                repair_date: repair_date.as_deref().map(parse_date).transpose()?,
                notes,
            };

            let device = service.create(input)?;
            println!("Added device: {} ({})", device.name, device.id);
        }

        DeviceCommands::Edit {
            device,
            name,
            device_type,
            status,
            condition,
            description,
            clear_description,
            maintenance_date,
            clear_maintenance_date,
            repair_date,
            clear_repair_date,
            notes,
            clear_notes,
        } => {
            let patch = DevicePatch {
                name,
                device_type,
                status: status.as_deref().map(parse_status).transpose()?,
                condition: condition.as_deref().map(parse_condition).transpose()?,
                description: clearable(description, clear_description),
                maintenance_date: clearable(
                    maintenance_date.as_deref().map(parse_date).transpose()?,
                    clear_maintenance_date,
                ),
                repair_date: clearable(
                    repair_date.as_deref().map(parse_date).transpose()?,
                    clear_repair_date,
                ),
                notes: clearable(notes, clear_notes),
            };

            if patch.is_empty() {
                return Err(InventoryError::Validation(
                    "Nothing to change. Pass at least one field to edit.".into(),
                ));
            }

            let id = service.resolve(&device)?;
            let updated = service.update(id, patch)?;
            println!("Updated device: {}", updated.name);
        }

        DeviceCommands::Remove { device } => {
            let id = service.resolve(&device)?;
            let removed = service.delete(id)?;
            println!("Removed device: {} ({})", removed.name, removed.id);
        }

        DeviceCommands::History { device, json } => {
            let id = service.resolve(&device)?;
            let entries = service.history(id)?;

            if json {
                let output = serde_json::to_string_pretty(&entries)?;
                println!("{}", output);
            } else {
                print!("{}", format_history(&entries));
                if entries.is_empty() {
                    println!();
                }
            }
        }
    }

    Ok(())
}

fn parse_status(s: &str) -> InventoryResult<DeviceStatus> {
    s.parse().map_err(InventoryError::Validation)
}

fn parse_condition(s: &str) -> InventoryResult<DeviceCondition> {
    s.parse().map_err(InventoryError::Validation)
}

fn parse_date(s: &str) -> InventoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        InventoryError::Validation(format!("Invalid date '{}'. Use YYYY-MM-DD", s))
    })
}

/// `--field x` sets, `--clear-field` unsets, neither leaves it alone
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_status("maintenance").unwrap(), DeviceStatus::Maintenance);
        assert!(matches!(
            parse_status("broken"),
            Err(InventoryError::Validation(_))
        ));
        assert_eq!(parse_condition("kém").unwrap(), DeviceCondition::Poor);
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(parse_date("01/03/2024").is_err());
    }

    #[test]
    fn test_clearable() {
        assert_eq!(clearable(Some("x"), false), Some(Some("x")));
        assert_eq!(clearable(None::<&str>, true), Some(None));
        assert_eq!(clearable(None::<&str>, false), None);
    }
}
