//! User settings for the inventory
//!
//! Manages preferences such as the default page size, session lifetime,
//! date formatting for exports and the default log level.

use serde::{Deserialize, Serialize};

use super::paths::InventoryPaths;
use crate::error::InventoryError;

/// Longest accepted session lifetime, one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Settings persisted in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Page size used by `device list` when none is given
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// How long a login token stays valid
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// Date format preference for exports (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Heading of the printable document export
    #[serde(default = "default_document_title")]
    pub document_title: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_page_size() -> usize {
    10
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_date_format() -> String {
    "%d/%m/%Y".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_document_title() -> String {
    "Danh sách thiết bị".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_page_size: default_page_size(),
            session_ttl_hours: default_session_ttl_hours(),
            date_format: default_date_format(),
            log_level: default_log_level(),
            document_title: default_document_title(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &InventoryPaths) -> Result<Self, InventoryError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                InventoryError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                InventoryError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Reject values the rest of the crate cannot work with
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.default_page_size == 0 {
            return Err(InventoryError::Config(
                "default_page_size must be at least 1".into(),
            ));
        }

        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(InventoryError::Config(format!(
                "session_ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS, self.session_ttl_hours
            )));
        }

        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &InventoryPaths) -> Result<(), InventoryError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            InventoryError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| InventoryError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
