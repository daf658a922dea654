//! Storage layer for the inventory
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation, plus the append-only history log.

pub mod devices;
pub mod file_io;
pub mod sessions;
pub mod users;

pub use devices::DeviceRepository;
pub use file_io::{read_json, write_json_atomic};
pub use sessions::{Session, SessionRepository};
pub use users::UserRepository;

use crate::config::paths::InventoryPaths;
use crate::error::InventoryError;
use crate::history::HistoryLog;

/// Store handle shared by every service
///
/// Created once by the entry point and passed by reference; nothing in the
/// crate reaches for a global connection.
pub struct Storage {
    paths: InventoryPaths,
    pub devices: DeviceRepository,
    pub history: HistoryLog,
    pub users: UserRepository,
    pub sessions: SessionRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: InventoryPaths) -> Result<Self, InventoryError> {
        paths.ensure_directories()?;

        Ok(Self {
            devices: DeviceRepository::new(paths.devices_file()),
            history: HistoryLog::new(paths.history_file()),
            users: UserRepository::new(paths.users_file()),
            sessions: SessionRepository::new(paths.sessions_file()),
            paths,
        })
    }

    /// Create and load in one step
    pub fn open(paths: InventoryPaths) -> Result<Self, InventoryError> {
        let mut storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &InventoryPaths {
        &self.paths
    }

    /// Load all data from disk
    ///
    /// The history log is not read here; it is indexed on first lookup.
    pub fn load_all(&mut self) -> Result<(), InventoryError> {
        self.devices.load()?;
        self.users.load()?;
        self.sessions.load()?;
        Ok(())
    }

    /// Check if storage has been initialized (has a settings file)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Device;
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(!storage.is_initialized());
        assert_eq!(storage.devices.count().unwrap(), 0);
    }

    #[test]
    fn test_open_survives_torn_history_line() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());

        let storage = Storage::open(paths.clone()).unwrap();
        storage.devices.insert(Device::new("Printer", "Máy in")).unwrap();
        drop(storage);

        std::fs::write(paths.history_file(), "{\"id\":\"9b1c0e").unwrap();

        let reopened = Storage::open(paths).unwrap();
        assert_eq!(reopened.devices.get_all().unwrap()[0].name, "Printer");
        assert_eq!(reopened.history.entry_count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_sees_devices() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());

        let storage = Storage::open(paths.clone()).unwrap();
        storage.devices.insert(Device::new("Printer", "Máy in")).unwrap();
        drop(storage);

        let reopened = Storage::open(paths).unwrap();
        assert_eq!(reopened.devices.count().unwrap(), 1);
    }
}
