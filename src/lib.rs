//! Inventory - device inventory management with a change-history trail
//!
//! This library provides the core functionality for the `inventory` command:
//! a store of physical devices that can be searched, filtered and paged,
//! edited by signed-in staff, and exported, with every change recorded in an
//! append-only history.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Devices, users and their IDs
//! - `storage`: JSON file storage layer with revision-checked writes
//! - `history`: Append-only change log
//! - `services`: Query engine, mutation service and authentication
//! - `export`: CSV table and printable document
//! - `crypto`: Password hashing and session tokens
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use inventory::config::{paths::InventoryPaths, settings::Settings};
//! use inventory::services::{DeviceQuery, DeviceService};
//! use inventory::storage::Storage;
//!
//! let paths = InventoryPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//!
//! let page = DeviceService::new(&storage).list(&DeviceQuery::new().search("printer"))?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod history;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{InventoryError, InventoryResult};
