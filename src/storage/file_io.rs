//! Whole-file JSON persistence for the record stores
//!
//! `devices.json`, `users.json` and `sessions.json` are rewritten in full on
//! every save. A save goes to a `.json.tmp` sibling that is synced and then
//! renamed over the store, so readers see either the old file or the new one.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::InventoryError;

fn unavailable(action: &str, path: &Path, e: impl Display) -> InventoryError {
    InventoryError::StoreUnavailable(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Load a store file; a store that was never saved reads as empty
pub fn read_json<T, P>(path: P) -> Result<T, InventoryError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(unavailable("open", path, e)),
    };

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| InventoryError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Replace a store file with `data`
///
/// On error the previous file is left as it was and the temp file is removed.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), InventoryError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| unavailable("create directory", dir, e))?;
    }

    // Same directory as the store, so the rename cannot cross filesystems
    let temp_path = path.with_extension("json.tmp");

    let result = write_synced(&temp_path, data)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| unavailable("replace", path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn write_synced<T: Serialize>(temp_path: &Path, data: &T) -> Result<(), InventoryError> {
    let file = File::create(temp_path).map_err(|e| unavailable("create", temp_path, e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data).map_err(|e| {
        InventoryError::Json(format!("Failed to serialize {}: {}", temp_path.display(), e))
    })?;

    let file = writer
        .into_inner()
        .map_err(|e| unavailable("flush", temp_path, e.error()))?;

    file.sync_all().map_err(|e| unavailable("sync", temp_path, e))
}
