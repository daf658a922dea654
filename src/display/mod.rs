//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models for terminal display.

pub mod device;

pub use device::{format_device_details, format_device_page, format_history};
