//! Configuration module for the inventory
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::InventoryPaths;
pub use settings::Settings;
