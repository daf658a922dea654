//! Device service
//!
//! Listing, creation, partial update and deletion of devices. Every
//! committed mutation is followed by exactly one history entry.

use tracing::{debug, info, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::history::HistoryEntry;
use crate::models::{Device, DeviceId, DevicePatch, NewDevice};
use crate::storage::Storage;

use super::auth::Identity;
use super::query::{DevicePage, DeviceQuery};

/// Service for device management
pub struct DeviceService<'a> {
    storage: &'a Storage,
    actor: Option<String>,
}

impl<'a> DeviceService<'a> {
    /// Create a new device service
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            actor: None,
        }
    }

    /// Record `identity` as the author of history entries
    pub fn acting_as(mut self, identity: &Identity) -> Self {
        self.actor = Some(identity.username.clone());
        self
    }

    /// List one page of devices matching `query`
    pub fn list(&self, query: &DeviceQuery) -> InventoryResult<DevicePage> {
        query.validate()?;
        debug!(?query, "Listing devices");

        let matching = self.storage.devices.find_all(|d| query.matches(d))?;
        let page = query.paginate(matching);

        debug!(
            total = page.total,
            returned = page.devices.len(),
            "Listed devices"
        );
        Ok(page)
    }

    /// Get a device by ID
    pub fn get(&self, id: DeviceId) -> InventoryResult<Device> {
        self.storage
            .devices
            .get(id)?
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))
    }

    /// Resolve a full ID, a short `dev-xxxxxxxx` ID or an exact name
    ///
    /// A full ID is accepted without a store lookup so that deleted devices
    /// can still be named when reading their history.
    pub fn resolve(&self, identifier: &str) -> InventoryResult<DeviceId> {
        let identifier = identifier.trim();

        if let Ok(id) = identifier.parse::<DeviceId>() {
            return Ok(id);
        }

        let needle = identifier.to_lowercase();
        let by_short = self
            .storage
            .devices
            .find_all(|d| d.id.short() == needle)?;
        if let [device] = by_short.as_slice() {
            return Ok(device.id);
        }

        let by_name = self
            .storage
            .devices
            .find_all(|d| d.name.to_lowercase() == needle)?;
        match by_name.as_slice() {
            [device] => Ok(device.id),
            [] => Err(InventoryError::device_not_found(identifier)),
            many => Err(InventoryError::Validation(format!(
                "{} devices are named '{}', use the ID instead",
                many.len(),
                identifier
            ))),
        }
    }

    /// Create a new device
    ///
    /// Status and condition default when not supplied.
    pub fn create(&self, input: NewDevice) -> InventoryResult<Device> {
        let device = Device::from_input(input);

        device
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        self.storage.devices.insert(device.clone())?;
        info!(device_id = %device.id, name = %device.name, "Device created");

        self.record(HistoryEntry::created(&device, self.actor.clone()));

        Ok(device)
    }

    /// Merge `patch` over an existing device
    ///
    /// Fails with `Conflict` if another writer replaced the device between
    /// the read and the write.
    pub fn update(&self, id: DeviceId, patch: DevicePatch) -> InventoryResult<Device> {
        let (before, revision) = self
            .storage
            .devices
            .get_with_revision(id)?
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))?;

        let mut after = before.clone();
        patch.apply_to(&mut after);

        after
            .validate()
            .map_err(|e| InventoryError::Validation(e.to_string()))?;

        self.storage.devices.replace(after.clone(), revision)?;
        info!(device_id = %id, revision = revision + 1, "Device updated");

        self.record(HistoryEntry::updated(&before, &after, self.actor.clone()));

        Ok(after)
    }

    /// Delete a device, returning its final state
    pub fn delete(&self, id: DeviceId) -> InventoryResult<Device> {
        let (snapshot, revision) = self
            .storage
            .devices
            .get_with_revision(id)?
            .ok_or_else(|| InventoryError::device_not_found(id.to_string()))?;

        let removed = self.storage.devices.remove(snapshot.id, revision)?;
        info!(device_id = %id, name = %removed.name, "Device deleted");

        self.record(HistoryEntry::deleted(&removed, self.actor.clone()));

        Ok(removed)
    }

    /// Every history entry for a device, most recent first
    ///
    /// Works for devices that have since been deleted.
    pub fn history(&self, id: DeviceId) -> InventoryResult<Vec<HistoryEntry>> {
        self.storage.history.for_device(id)
    }

    /// Append to the history after a committed mutation
    ///
    /// A failure here leaves the mutation in place and is only logged.
    fn record(&self, entry: HistoryEntry) {
        if let Err(e) = self.storage.history.append(&entry) {
            warn!(
                device_id = %entry.device_id,
                action = %entry.action(),
                error = %e,
                "Mutation committed but history entry was not recorded"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::InventoryPaths;
    use crate::history::{HistoryAction, HistoryPayload};
    use crate::models::{DeviceCondition, DeviceStatus, Role};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_applies_defaults_and_records_history() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let device = service.create(NewDevice::new("Printer A", "Máy in")).unwrap();

        assert_eq!(device.status, DeviceStatus::Active);
        assert_eq!(device.condition, DeviceCondition::Good);
        assert_eq!(device.condition.as_str(), "tốt");

        let history = service.history(device.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action(), HistoryAction::Create);
        assert_eq!(history[0].payload, HistoryPayload::Created(device.clone()));
        assert!(history[0].created_at >= device.created_at);
    }

    #[test]
    fn test_create_requires_name_and_type() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let result = service.create(NewDevice::new("", "Máy in"));
        assert!(matches!(result, Err(InventoryError::Validation(_))));

        let result = service.create(NewDevice::new("Printer", "  "));
        assert!(matches!(result, Err(InventoryError::Validation(_))));

        assert_eq!(storage.devices.count().unwrap(), 0);
        assert_eq!(storage.history.entry_count().unwrap(), 0);
    }

    #[test]
    fn test_list_search_scenario() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let printer = service.create(NewDevice::new("Printer A", "Máy in")).unwrap();
        service.create(NewDevice::new("Laptop B", "Máy tính")).unwrap();

        let page = service
            .list(&DeviceQuery::new().search("Printer").page(1).page_size(10))
            .unwrap();

        assert_eq!(page.devices, vec![printer]);
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_list_rejects_zero_page_size() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let result = service.list(&DeviceQuery::new().page_size(0));
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_update_records_before_and_after() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let mut input = NewDevice::new("Printer A", "Máy in");
        input.description = Some("Tầng 2".into());
        let original = service.create(input).unwrap();

        let updated = service
            .update(
                original.id,
                DevicePatch::default().status(DeviceStatus::Maintenance),
            )
            .unwrap();

        assert_eq!(updated.status, DeviceStatus::Maintenance);

        let history = service.history(original.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action(), HistoryAction::Update);

        match &history[0].payload {
            HistoryPayload::Updated { before, after } => {
                assert_eq!(before.status, DeviceStatus::Active);
                assert_eq!(after.status, DeviceStatus::Maintenance);

                // Everything but the patched field is untouched
                let mut expected = before.clone();
                expected.status = DeviceStatus::Maintenance;
                assert_eq!(after, &expected);
                assert_eq!(before, &original);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_update_missing_device() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let result = service.update(DeviceId::new(), DevicePatch::default().name("X"));
        assert!(matches!(result, Err(InventoryError::NotFound { .. })));
        assert_eq!(storage.history.entry_count().unwrap(), 0);
    }

    #[test]
    fn test_update_cannot_blank_the_name() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);
        let device = service.create(NewDevice::new("Printer", "Máy in")).unwrap();

        let result = service.update(device.id, DevicePatch::default().name("  "));
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(service.get(device.id).unwrap().name, "Printer");
    }

    #[test]
    fn test_stale_revision_is_a_conflict() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);
        let device = service.create(NewDevice::new("Printer", "Máy in")).unwrap();

        // A writer that read revision 0 loses to one that already committed
        let (stale, revision) = storage.devices.get_with_revision(device.id).unwrap().unwrap();
        service
            .update(device.id, DevicePatch::default().name("Renamed"))
            .unwrap();

        let result = storage.devices.replace(stale, revision);
        assert!(matches!(result, Err(InventoryError::Conflict(_))));
        assert_eq!(service.get(device.id).unwrap().name, "Renamed");
    }

    #[test]
    fn test_concurrent_updates_do_not_lose_writes_silently() {
        let (_temp_dir, storage) = create_test_storage();
        let device = DeviceService::new(&storage)
            .create(NewDevice::new("Printer", "Máy in"))
            .unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let storage = &storage;
                    scope.spawn(move || {
                        DeviceService::new(storage)
                            .update(device.id, DevicePatch::default().name(format!("Name {}", i)))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let committed = results.iter().filter(|r| r.is_ok()).count();
        assert!(committed >= 1);
        assert!(results
            .iter()
            .all(|r| r.is_ok() || matches!(r, Err(InventoryError::Conflict(_)))));

        // One update entry per committed write, plus the create
        let history = storage.history.for_device(device.id).unwrap();
        assert_eq!(history.len(), committed + 1);
    }

    #[test]
    fn test_delete_keeps_history() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);
        let device = service.create(NewDevice::new("Old Scanner", "Máy quét")).unwrap();

        let removed = service.delete(device.id).unwrap();
        assert_eq!(removed, device);
        assert!(matches!(
            service.get(device.id),
            Err(InventoryError::NotFound { .. })
        ));

        let history = service.history(device.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].payload, HistoryPayload::Deleted(device));
    }

    #[test]
    fn test_delete_missing_device() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);

        let result = service.delete(DeviceId::new());
        assert!(matches!(result, Err(InventoryError::NotFound { .. })));
    }

    #[test]
    fn test_history_failure_does_not_fail_mutation() {
        let (_temp_dir, storage) = create_test_storage();
        // Put a directory where the log file should be
        std::fs::create_dir(storage.paths().history_file()).unwrap();
        let service = DeviceService::new(&storage);

        let device = service.create(NewDevice::new("Printer", "Máy in")).unwrap();
        assert!(storage.devices.exists(device.id).unwrap());

        std::fs::remove_dir(storage.paths().history_file()).unwrap();
        assert!(service.history(device.id).unwrap().is_empty());
    }

    #[test]
    fn test_two_stores_on_one_directory() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());
        let first = Storage::open(paths.clone()).unwrap();
        let second = Storage::open(paths.clone()).unwrap();

        let x = DeviceService::new(&first)
            .create(NewDevice::new("Printer X", "Máy in"))
            .unwrap();
        let y = DeviceService::new(&second)
            .create(NewDevice::new("Laptop Y", "Máy tính"))
            .unwrap();

        let reopened = Storage::open(paths.clone()).unwrap();
        assert_eq!(reopened.devices.count().unwrap(), 2);
        assert!(reopened.devices.exists(x.id).unwrap());
        assert!(reopened.devices.exists(y.id).unwrap());

        // `second` picked up x at revision 0 when it created y
        let (stale, revision) = second.devices.get_with_revision(x.id).unwrap().unwrap();
        DeviceService::new(&first)
            .update(x.id, DevicePatch::default().name("Renamed"))
            .unwrap();

        let mut edit = stale;
        edit.status = DeviceStatus::Maintenance;
        let result = second.devices.replace(edit, revision);
        assert!(matches!(result, Err(InventoryError::Conflict(_))));

        let reopened = Storage::open(paths).unwrap();
        let stored = reopened.devices.get(x.id).unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.status, DeviceStatus::Active);
    }

    #[test]
    fn test_resolve() {
        let (_temp_dir, storage) = create_test_storage();
        let service = DeviceService::new(&storage);
        let printer = service.create(NewDevice::new("Printer A", "Máy in")).unwrap();
        service.create(NewDevice::new("Twin", "Máy in")).unwrap();
        service.create(NewDevice::new("twin", "Máy in")).unwrap();

        assert_eq!(service.resolve(&printer.id.to_string()).unwrap(), printer.id);
        assert_eq!(service.resolve(&printer.id.short()).unwrap(), printer.id);
        assert_eq!(service.resolve("printer a").unwrap(), printer.id);

        assert!(matches!(
            service.resolve("Twin"),
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            service.resolve("Nothing"),
            Err(InventoryError::NotFound { .. })
        ));

        // Deleted devices stay addressable by full ID
        service.delete(printer.id).unwrap();
        assert_eq!(service.resolve(&printer.id.to_string()).unwrap(), printer.id);
    }

    #[test]
    fn test_actor_is_recorded() {
        let (_temp_dir, storage) = create_test_storage();
        let identity = Identity {
            user_id: crate::models::UserId::new(),
            username: "staff".into(),
            role: Role::User,
        };
        let service = DeviceService::new(&storage).acting_as(&identity);

        let device = service.create(NewDevice::new("Printer", "Máy in")).unwrap();
        let history = service.history(device.id).unwrap();
        assert_eq!(history[0].actor.as_deref(), Some("staff"));
    }
}
