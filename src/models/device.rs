//! Device model
//!
//! Represents a physical device tracked by the inventory, together with the
//! inputs used to create and partially update one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::DeviceId;

/// Maximum length of a device name, in characters
pub const MAX_NAME_LEN: usize = 200;

/// Operational status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// In service
    #[default]
    Active,
    /// Out of service
    Inactive,
    /// Being serviced
    Maintenance,
}

impl DeviceStatus {
    pub fn all() -> [Self; 3] {
        [Self::Active, Self::Inactive, Self::Maintenance]
    }

    /// Stored value, as it appears in records and filters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
        }
    }

    /// Display label used by exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Đang hoạt động",
            Self::Inactive => "Không hoạt động",
            Self::Maintenance => "Đang bảo trì",
        }
    }

    /// Parse status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" | "đang hoạt động" => Some(Self::Active),
            "inactive" | "không hoạt động" => Some(Self::Inactive),
            "maintenance" | "đang bảo trì" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "invalid status '{}' (expected active, inactive or maintenance)",
                s
            )
        })
    }
}

/// Physical condition of a device
///
/// Serialized with the labels the inventory has always stored
/// ("tốt", "trung bình", "kém").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeviceCondition {
    #[default]
    #[serde(rename = "tốt")]
    Good,
    #[serde(rename = "trung bình")]
    Average,
    #[serde(rename = "kém")]
    Poor,
}

impl DeviceCondition {
    pub fn all() -> [Self; 3] {
        [Self::Good, Self::Average, Self::Poor]
    }

    /// Stored value, as it appears in records and filters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "tốt",
            Self::Average => "trung bình",
            Self::Poor => "kém",
        }
    }

    /// Display label used by exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Tốt",
            Self::Average => "Trung bình",
            Self::Poor => "Kém",
        }
    }

    /// Parse condition from either the stored value or its English name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tốt" | "tot" | "good" => Some(Self::Good),
            "trung bình" | "trung binh" | "average" | "fair" => Some(Self::Average),
            "kém" | "kem" | "poor" | "bad" => Some(Self::Poor),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "invalid condition '{}' (expected good/tốt, average/trung bình or poor/kém)",
                s
            )
        })
    }
}

/// A physical device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier, never changes
    pub id: DeviceId,

    /// Device name (e.g., "Printer A")
    pub name: String,

    /// Category label (e.g., "Máy in")
    #[serde(rename = "type")]
    pub device_type: String,

    #[serde(default)]
    pub status: DeviceStatus,

    #[serde(default)]
    pub condition: DeviceCondition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Last scheduled maintenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_date: Option<NaiveDate>,

    /// Last repair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// When the device was created, never changes
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Create a new device with default status and condition
    pub fn new(name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(),
            name: name.into(),
            device_type: device_type.into(),
            status: DeviceStatus::default(),
            condition: DeviceCondition::default(),
            description: None,
            maintenance_date: None,
            repair_date: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Build a device from creation input, applying defaults
    pub fn from_input(input: NewDevice) -> Self {
        let mut device = Self::new(input.name.trim(), input.device_type.trim());
        device.status = input.status.unwrap_or_default();
        device.condition = input.condition.unwrap_or_default();
        device.description = non_blank(input.description);
        device.maintenance_date = input.maintenance_date;
        device.repair_date = input.repair_date;
        device.notes = non_blank(input.notes);
        device
    }

    /// Case-insensitive substring match against name or description
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lower))
    }

    /// Validate the device
    pub fn validate(&self) -> Result<(), DeviceValidationError> {
        if self.name.trim().is_empty() {
            return Err(DeviceValidationError::EmptyName);
        }

        let len = self.name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(DeviceValidationError::NameTooLong(len));
        }

        if self.device_type.trim().is_empty() {
            return Err(DeviceValidationError::EmptyType);
        }

        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.device_type)
    }
}

/// Validation errors for devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceValidationError {
    EmptyName,
    NameTooLong(usize),
    EmptyType,
}

impl fmt::Display for DeviceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Device name is required"),
            Self::NameTooLong(len) => write!(
                f,
                "Device name is too long ({} characters, max {})",
                len, MAX_NAME_LEN
            ),
            Self::EmptyType => write!(f, "Device type is required"),
        }
    }
}

impl std::error::Error for DeviceValidationError {}

/// Input for creating a device
#[derive(Debug, Clone, Default)]
pub struct NewDevice {
    pub name: String,
    pub device_type: String,
    pub status: Option<DeviceStatus>,
    pub condition: Option<DeviceCondition>,
    pub description: Option<String>,
    pub maintenance_date: Option<NaiveDate>,
    pub repair_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, device_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_type: device_type.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a device
///
/// `None` leaves a field untouched. For optional fields `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub device_type: Option<String>,
    pub status: Option<DeviceStatus>,
    pub condition: Option<DeviceCondition>,
    pub description: Option<Option<String>>,
    pub maintenance_date: Option<Option<NaiveDate>>,
    pub repair_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

impl DevicePatch {
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn condition(mut self, condition: DeviceCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// True if the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.device_type.is_none()
            && self.status.is_none()
            && self.condition.is_none()
            && self.description.is_none()
            && self.maintenance_date.is_none()
            && self.repair_date.is_none()
            && self.notes.is_none()
    }

    /// Merge the supplied fields over `device`
    ///
    /// `id` and `created_at` are never touched.
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(name) = &self.name {
            device.name = name.trim().to_string();
        }
        if let Some(device_type) = &self.device_type {
            device.device_type = device_type.trim().to_string();
        }
        if let Some(status) = self.status {
            device.status = status;
        }
        if let Some(condition) = self.condition {
            device.condition = condition;
        }
        if let Some(description) = &self.description {
            device.description = non_blank(description.clone());
        }
        if let Some(date) = self.maintenance_date {
            device.maintenance_date = date;
        }
        if let Some(date) = self.repair_date {
            device.repair_date = date;
        }
        if let Some(notes) = &self.notes {
            device.notes = non_blank(notes.clone());
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
