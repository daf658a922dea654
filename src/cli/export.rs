//! CLI commands for data export
//!
//! Writes the device table or the printable document to a file, or to
//! stdout when no file is given.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::{InventoryError, InventoryResult};
use crate::export::{export_devices_csv, export_devices_document};
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export every device as a CSV table
    Table {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export every device as a printable text document
    Document {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle export commands
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> InventoryResult<()> {
    match cmd {
        ExportCommands::Table { output } => match output {
            Some(path) => {
                let count = export_devices_csv(storage, settings, create_file(&path)?)?;
                println!("Exported {} devices to: {}", count, path.display());
            }
            None => {
                export_devices_csv(storage, settings, io::stdout().lock())?;
            }
        },

        ExportCommands::Document { output } => match output {
            Some(path) => {
                let mut writer = create_file(&path)?;
                let count = export_devices_document(storage, settings, &mut writer)?;
                println!("Exported {} devices to: {}", count, path.display());
            }
            None => {
                let mut stdout = io::stdout().lock();
                export_devices_document(storage, settings, &mut stdout)?;
                stdout
                    .flush()
                    .map_err(|e| InventoryError::Export(e.to_string()))?;
            }
        },
    }

    Ok(())
}

fn create_file(path: &Path) -> InventoryResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        InventoryError::Export(format!(
            "Failed to create file {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(BufWriter::new(file))
}
