//! Device repository for JSON storage
//!
//! Manages loading and saving devices to devices.json. Every stored record
//! carries a revision counter; `replace` and `remove` only succeed against the
//! revision the caller read, so a read-modify-write that raced with another
//! writer fails with `Conflict` instead of silently losing an update.
//!
//! Writers in separate processes are serialized by an advisory lock on
//! `devices.lock` next to the store. Under that lock the file is re-read, so
//! revision checks and duplicate checks run against what is on disk.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::InventoryError;
use crate::models::{Device, DeviceId};

use super::file_io::{read_json, write_json_atomic};

/// A device as persisted, with its revision
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDevice {
    #[serde(flatten)]
    device: Device,
    #[serde(default)]
    revision: u64,
}

/// Serializable device data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DeviceData {
    devices: Vec<StoredDevice>,
}

/// Exclusive hold on the sidecar lock file, released on drop
struct WriterLock {
    file: File,
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Repository for device persistence
pub struct DeviceRepository {
    path: PathBuf,
    lock_path: PathBuf,
    data: RwLock<HashMap<DeviceId, StoredDevice>>,
}

impl DeviceRepository {
    /// Create a new device repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            lock_path: path.with_extension("lock"),
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<DeviceId, StoredDevice>>, InventoryError> {
        self.data.read().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
        })
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<DeviceId, StoredDevice>>, InventoryError> {
        self.data.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })
    }

    /// Load devices from disk
    pub fn load(&self) -> Result<(), InventoryError> {
        let on_disk = self.read_disk()?;
        *self.write()? = on_disk;
        Ok(())
    }

    fn read_disk(&self) -> Result<HashMap<DeviceId, StoredDevice>, InventoryError> {
        let file_data: DeviceData = read_json(&self.path)?;
        Ok(file_data
            .devices
            .into_iter()
            .map(|stored| (stored.device.id, stored))
            .collect())
    }

    /// Take the cross-process writer lock and refresh `data` from disk
    ///
    /// Must be called with the in-memory write lock held. The returned guard
    /// has to outlive the following `persist`.
    fn lock_and_refresh(
        &self,
        data: &mut HashMap<DeviceId, StoredDevice>,
    ) -> Result<WriterLock, InventoryError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                InventoryError::StoreUnavailable(format!(
                    "Failed to open lock file {}: {}",
                    self.lock_path.display(),
                    e
                ))
            })?;

        file.lock_exclusive().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to lock device store: {}", e))
        })?;
        let guard = WriterLock { file };

        *data = self.read_disk()?;
        debug!(devices = data.len(), "Device store refreshed under writer lock");

        Ok(guard)
    }

    /// Write the whole map to disk; called with the write lock held
    fn persist(&self, data: &HashMap<DeviceId, StoredDevice>) -> Result<(), InventoryError> {
        let mut devices: Vec<_> = data.values().cloned().collect();
        devices.sort_by(|a, b| {
            a.device
                .created_at
                .cmp(&b.device.created_at)
                .then(a.device.id.cmp(&b.device.id))
        });

        write_json_atomic(&self.path, &DeviceData { devices })
    }

    /// Get a device by ID
    pub fn get(&self, id: DeviceId) -> Result<Option<Device>, InventoryError> {
        Ok(self.read()?.get(&id).map(|s| s.device.clone()))
    }

    /// Get a device together with the revision it was read at
    pub fn get_with_revision(&self, id: DeviceId) -> Result<Option<(Device, u64)>, InventoryError> {
        Ok(self
            .read()?
            .get(&id)
            .map(|s| (s.device.clone(), s.revision)))
    }

    /// Get all devices, oldest first
    pub fn get_all(&self) -> Result<Vec<Device>, InventoryError> {
        let mut devices = self.find_all(|_| true)?;
        devices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(devices)
    }

    /// Clone every device matching `predicate`, in no particular order
    pub fn find_all<F>(&self, predicate: F) -> Result<Vec<Device>, InventoryError>
    where
        F: Fn(&Device) -> bool,
    {
        Ok(self
            .read()?
            .values()
            .filter(|s| predicate(&s.device))
            .map(|s| s.device.clone())
            .collect())
    }

    /// Insert a new device and persist it
    pub fn insert(&self, device: Device) -> Result<(), InventoryError> {
        let mut data = self.write()?;
        let _lock = self.lock_and_refresh(&mut data)?;

        if data.contains_key(&device.id) {
            return Err(InventoryError::Duplicate {
                entity_type: "Device",
                identifier: device.id.to_string(),
            });
        }

        let id = device.id;
        data.insert(
            id,
            StoredDevice {
                device,
                revision: 0,
            },
        );

        if let Err(e) = self.persist(&data) {
            data.remove(&id);
            return Err(e);
        }

        Ok(())
    }

    /// Replace a device if it is still at `expected_revision`
    ///
    /// Returns the new revision.
    pub fn replace(&self, device: Device, expected_revision: u64) -> Result<u64, InventoryError> {
        let mut data = self.write()?;
        let _lock = self.lock_and_refresh(&mut data)?;
        let id = device.id;

        let current = data
            .get(&id)
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))?;

        if current.revision != expected_revision {
            return Err(InventoryError::Conflict(format!(
                "device {} was modified concurrently (expected revision {}, found {})",
                id, expected_revision, current.revision
            )));
        }

        let revision = expected_revision + 1;
        let previous = data.insert(id, StoredDevice { device, revision });

        if let Err(e) = self.persist(&data) {
            if let Some(previous) = previous {
                data.insert(id, previous);
            }
            return Err(e);
        }

        Ok(revision)
    }

    /// Remove a device if it is still at `expected_revision`
    pub fn remove(&self, id: DeviceId, expected_revision: u64) -> Result<Device, InventoryError> {
        let mut data = self.write()?;
        let _lock = self.lock_and_refresh(&mut data)?;

        let current = data
            .get(&id)
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))?;

        if current.revision != expected_revision {
            return Err(InventoryError::Conflict(format!(
                "device {} was modified concurrently (expected revision {}, found {})",
                id, expected_revision, current.revision
            )));
        }

        let removed = data
            .remove(&id)
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))?;

        if let Err(e) = self.persist(&data) {
            data.insert(id, removed);
            return Err(e);
        }

        Ok(removed.device)
    }

    /// Check if a device exists
    pub fn exists(&self, id: DeviceId) -> Result<bool, InventoryError> {
        Ok(self.read()?.contains_key(&id))
    }

    /// Count devices
    pub fn count(&self) -> Result<usize, InventoryError> {
        Ok(self.read()?.len())
    }
}
