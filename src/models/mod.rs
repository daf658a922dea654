//! Core data models for the inventory
//!
//! Devices, the inputs used to change them, and the staff accounts that may
//! do so.

pub mod device;
pub mod ids;
pub mod user;

pub use device::{
    Device, DeviceCondition, DevicePatch, DeviceStatus, DeviceValidationError, NewDevice,
};
pub use ids::{DeviceId, HistoryEntryId, UserId};
pub use user::{NewUser, Role, User};
