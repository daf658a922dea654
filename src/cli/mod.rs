//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod auth;
pub mod device;
pub mod export;

pub use auth::{
    handle_admin_command, handle_auth_command, require_identity, AdminCommands, AuthCommands,
};
pub use device::{handle_device_command, DeviceCommands};
pub use export::{handle_export_command, ExportCommands};
