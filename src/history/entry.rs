//! History entry data structures
//!
//! Defines the action kinds, the per-action payload and the entry format
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Device, DeviceId, HistoryEntryId};

use super::diff::generate_diff;

/// Kinds of change recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryAction::Create => write!(f, "CREATE"),
            HistoryAction::Update => write!(f, "UPDATE"),
            HistoryAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// What a history entry recorded, shaped by its action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "changes")]
pub enum HistoryPayload {
    /// Full snapshot of the new record
    #[serde(rename = "create")]
    Created(Device),
    /// Snapshots on both sides of the merge
    #[serde(rename = "update")]
    Updated { before: Device, after: Device },
    /// Full snapshot at the time of removal
    #[serde(rename = "delete")]
    Deleted(Device),
}

impl HistoryPayload {
    pub fn action(&self) -> HistoryAction {
        match self {
            Self::Created(_) => HistoryAction::Create,
            Self::Updated { .. } => HistoryAction::Update,
            Self::Deleted(_) => HistoryAction::Delete,
        }
    }

    /// The device this payload is about
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::Created(device) | Self::Deleted(device) => device.id,
            Self::Updated { after, .. } => after.id,
        }
    }
}

/// A single, immutable history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: HistoryEntryId,

    /// Device the change applies to; the device may no longer exist
    pub device_id: DeviceId,

    pub payload: HistoryPayload,

    /// Username of whoever made the change, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// When the change was recorded (UTC)
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn with_payload(payload: HistoryPayload, actor: Option<String>) -> Self {
        Self {
            id: HistoryEntryId::new(),
            device_id: payload.device_id(),
            payload,
            actor,
            created_at: Utc::now(),
        }
    }

    /// Entry for a freshly created device
    pub fn created(device: &Device, actor: Option<String>) -> Self {
        Self::with_payload(HistoryPayload::Created(device.clone()), actor)
    }

    /// Entry for an update
    pub fn updated(before: &Device, after: &Device, actor: Option<String>) -> Self {
        Self::with_payload(
            HistoryPayload::Updated {
                before: before.clone(),
                after: after.clone(),
            },
            actor,
        )
    }

    /// Entry for a removed device
    pub fn deleted(device: &Device, actor: Option<String>) -> Self {
        Self::with_payload(HistoryPayload::Deleted(device.clone()), actor)
    }

    pub fn action(&self) -> HistoryAction {
        self.payload.action()
    }

    /// Field-level summary of an update, `None` for other actions
    pub fn diff_summary(&self) -> Option<String> {
        match &self.payload {
            HistoryPayload::Updated { before, after } => {
                let before = serde_json::to_value(before).ok()?;
                let after = serde_json::to_value(after).ok()?;
                generate_diff(&before, &after)
            }
            _ => None,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let name = match &self.payload {
            HistoryPayload::Created(device) | HistoryPayload::Deleted(device) => &device.name,
            HistoryPayload::Updated { after, .. } => &after.name,
        };

        let mut output = format!(
            "[{}] {} {} ({})",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action(),
            self.device_id.short(),
            name
        );

        if let Some(actor) = &self.actor {
            output.push_str(&format!(" by {}", actor));
        }

        if let Some(diff) = self.diff_summary() {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceStatus;

    #[test]
    fn test_action_display() {
        assert_eq!(HistoryAction::Create.to_string(), "CREATE");
        assert_eq!(HistoryAction::Update.to_string(), "UPDATE");
        assert_eq!(HistoryAction::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_created_entry() {
        let device = Device::new("Printer A", "Máy in");
        let entry = HistoryEntry::created(&device, Some("admin".into()));

        assert_eq!(entry.action(), HistoryAction::Create);
        assert_eq!(entry.device_id, device.id);
        assert_eq!(entry.payload, HistoryPayload::Created(device));
        assert!(entry.diff_summary().is_none());
    }

    #[test]
    fn test_updated_entry_diff() {
        let before = Device::new("Printer A", "Máy in");
        let mut after = before.clone();
        after.status = DeviceStatus::Maintenance;

        let entry = HistoryEntry::updated(&before, &after, None);

        assert_eq!(entry.action(), HistoryAction::Update);
        let diff = entry.diff_summary().unwrap();
        assert_eq!(diff, "status: \"active\" -> \"maintenance\"");
    }

    #[test]
    fn test_deleted_entry() {
        let device = Device::new("Old Scanner", "Máy quét");
        let entry = HistoryEntry::deleted(&device, None);

        assert_eq!(entry.action(), HistoryAction::Delete);
        match &entry.payload {
            HistoryPayload::Deleted(snapshot) => assert_eq!(snapshot, &device),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_payload_wire_shape() {
        let before = Device::new("Printer A", "Máy in");
        let after = before.clone();
        let entry = HistoryEntry::updated(&before, &after, None);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["payload"]["action"], "update");
        assert_eq!(json["payload"]["changes"]["before"]["name"], "Printer A");
        assert!(json.get("actor").is_none());

        let back: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_human_readable_format() {
        let device = Device::new("Printer A", "Máy in");
        let entry = HistoryEntry::created(&device, Some("staff".into()));

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE"));
        assert!(formatted.contains("Printer A"));
        assert!(formatted.contains("by staff"));
    }
}
