//! Change history for devices
//!
//! Records every create, update and delete with full snapshots in an
//! append-only log.
//!
//! # Architecture
//!
//! - `HistoryEntry`: one immutable change, carrying a `HistoryPayload` whose
//!   shape depends on the action.
//! - `HistoryLog`: appends entries to a line-delimited JSON file (JSONL) and
//!   indexes them by device on first read.
//! - `generate_diff`: human-readable summary of what an update changed.
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory::history::{HistoryEntry, HistoryLog};
//!
//! let log = HistoryLog::new(paths.history_file());
//!
//! log.append(&HistoryEntry::updated(&before, &after, Some("admin".into())))?;
//! for entry in log.for_device(after.id)? {
//!     println!("{}", entry.format_human_readable());
//! }
//! ```

mod diff;
mod entry;
mod log;

pub use diff::generate_diff;
pub use entry::{HistoryAction, HistoryEntry, HistoryPayload};
pub use log::HistoryLog;
