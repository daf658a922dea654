//! Service layer for the inventory
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, authorization and the history trail.

pub mod auth;
pub mod device;
pub mod query;

pub use auth::{AuthService, Identity};
pub use device::DeviceService;
pub use query::{DevicePage, DeviceQuery, DEFAULT_PAGE_SIZE};
