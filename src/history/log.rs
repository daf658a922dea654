//! Append-only history log
//!
//! Entries are written as one JSON object per line (JSONL) and flushed
//! immediately. An in-memory index keyed by device serves history lookups;
//! it is built from the file the first time history is read, so opening the
//! store never depends on the log being readable.
//!
//! A crash can leave the last line half written. Such a line is skipped with
//! a warning, and the next append starts on a fresh line.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::error::{InventoryError, InventoryResult};
use crate::models::DeviceId;

use super::entry::HistoryEntry;

type DeviceIndex = HashMap<DeviceId, Vec<HistoryEntry>>;

/// The history store
pub struct HistoryLog {
    log_path: PathBuf,
    /// Entries per device, in append order; `None` until first read
    index: RwLock<Option<DeviceIndex>>,
}

impl HistoryLog {
    /// Create a HistoryLog backed by the given file
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            index: RwLock::new(None),
        }
    }

    fn write_index(&self) -> InventoryResult<RwLockWriteGuard<'_, Option<DeviceIndex>>> {
        self.index.write().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to acquire write lock: {}", e))
        })
    }

    /// Rebuild the index from the log file
    pub fn load(&self) -> InventoryResult<()> {
        let index = build_index(self.read_all()?);
        *self.write_index()? = Some(index);
        Ok(())
    }

    /// Run `f` against the index, building it first if needed
    fn with_index<R>(&self, f: impl FnOnce(&DeviceIndex) -> R) -> InventoryResult<R> {
        {
            let index = self.index.read().map_err(|e| {
                InventoryError::StoreUnavailable(format!("Failed to acquire read lock: {}", e))
            })?;
            if let Some(index) = index.as_ref() {
                return Ok(f(index));
            }
        }

        let mut slot = self.write_index()?;
        if slot.is_none() {
            let entries = self.read_all()?;
            debug!(entries = entries.len(), "History index built");
            *slot = Some(build_index(entries));
        }

        match slot.as_ref() {
            Some(index) => Ok(f(index)),
            None => Err(InventoryError::StoreUnavailable(
                "History index unavailable".into(),
            )),
        }
    }

    /// Append an entry
    ///
    /// The entry only becomes visible through `for_device` once the line
    /// has been written and flushed.
    pub fn append(&self, entry: &HistoryEntry) -> InventoryResult<()> {
        let json = serde_json::to_string(entry).map_err(|e| {
            InventoryError::Json(format!("Failed to serialize history entry: {}", e))
        })?;

        // Hold the index lock across the write so lines and index agree on order
        let mut index = self.write_index()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                InventoryError::StoreUnavailable(format!("Failed to open history log: {}", e))
            })?;

        let line = if ends_mid_line(&mut file)? {
            warn!(path = %self.log_path.display(), "History log ends mid-line; starting a new one");
            format!("\n{}\n", json)
        } else {
            format!("{}\n", json)
        };

        file.write_all(line.as_bytes()).map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to write history entry: {}", e))
        })?;

        file.flush().map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to flush history log: {}", e))
        })?;

        // An index that was never built will pick the line up from the file
        if let Some(index) = index.as_mut() {
            index
                .entry(entry.device_id)
                .or_default()
                .push(entry.clone());
        }

        Ok(())
    }

    /// Every entry for a device, most recent first
    ///
    /// Entries with equal timestamps keep reverse append order.
    pub fn for_device(&self, device_id: DeviceId) -> InventoryResult<Vec<HistoryEntry>> {
        let mut entries: Vec<HistoryEntry> = self.with_index(|index| {
            index
                .get(&device_id)
                .map(|v| v.iter().rev().cloned().collect())
                .unwrap_or_default()
        })?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(entries)
    }

    /// Read all entries from the log file, oldest first
    ///
    /// An unparseable last line is skipped with a warning. An unparseable
    /// line followed by valid entries is an error.
    pub fn read_all(&self) -> InventoryResult<Vec<HistoryEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path).map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to open history log: {}", e))
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut torn: Option<(usize, serde_json::Error)> = None;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                InventoryError::StoreUnavailable(format!(
                    "Failed to read history log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            if let Some((bad_line, e)) = torn.take() {
                return Err(InventoryError::Json(format!(
                    "Failed to parse history entry at line {}: {}",
                    bad_line, e
                )));
            }

            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => torn = Some((line_num + 1, e)),
            }
        }

        if let Some((bad_line, e)) = torn {
            warn!(
                path = %self.log_path.display(),
                line = bad_line,
                error = %e,
                "Skipping incomplete last history entry"
            );
        }

        Ok(entries)
    }

    /// Number of entries in the log
    pub fn entry_count(&self) -> InventoryResult<usize> {
        self.with_index(|index| index.values().map(Vec::len).sum())
    }

    /// Get the path to the history log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

fn build_index(entries: Vec<HistoryEntry>) -> DeviceIndex {
    let mut index = DeviceIndex::new();
    for entry in entries {
        index.entry(entry.device_id).or_default().push(entry);
    }
    index
}

/// Whether a non-empty log is missing its final newline
fn ends_mid_line(file: &mut File) -> InventoryResult<bool> {
    let len = file
        .metadata()
        .map_err(|e| InventoryError::StoreUnavailable(format!("Failed to stat history log: {}", e)))?
        .len();
    if len == 0 {
        return Ok(false);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| {
            InventoryError::StoreUnavailable(format!("Failed to read history log: {}", e))
        })?;

    Ok(last[0] != b'\n')
}
