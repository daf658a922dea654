//! Path management for the inventory
//!
//! Resolves where settings, device records, the history log and auth state live.
//!
//! ## Path Resolution Order
//!
//! 1. `INVENTORY_DATA_DIR` environment variable (if set)
//! 2. The platform config directory reported by `directories`
//!    (e.g. `~/.config/inventory-cli` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::InventoryError;

/// Environment variable that overrides the base directory
pub const DATA_DIR_ENV: &str = "INVENTORY_DATA_DIR";

/// Manages all paths used by the inventory
#[derive(Debug, Clone)]
pub struct InventoryPaths {
    base_dir: PathBuf,
}

impl InventoryPaths {
    /// Create a new InventoryPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and
    /// `INVENTORY_DATA_DIR` is not set.
    pub fn new() -> Result<Self, InventoryError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            ProjectDirs::from("", "", "inventory-cli")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| {
                    InventoryError::Config("Could not determine a home directory".into())
                })?
        };

        Ok(Self { base_dir })
    }

    /// Create InventoryPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory (<base>/data/)
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Where `auth login` keeps the current bearer token
    pub fn token_file(&self) -> PathBuf {
        self.base_dir.join("token")
    }

    /// Get the path to devices.json
    pub fn devices_file(&self) -> PathBuf {
        self.data_dir().join("devices.json")
    }

    /// Get the path to the append-only history log
    pub fn history_file(&self) -> PathBuf {
        self.data_dir().join("history.jsonl")
    }

    /// Get the path to users.json
    pub fn users_file(&self) -> PathBuf {
        self.data_dir().join("users.json")
    }

    /// Get the path to sessions.json
    pub fn sessions_file(&self) -> PathBuf {
        self.data_dir().join("sessions.json")
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), InventoryError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| InventoryError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| InventoryError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if the inventory has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
