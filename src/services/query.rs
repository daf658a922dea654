//! Device query engine
//!
//! Turns search text, exact-match filters and a page request into an ordered,
//! bounded page of devices.

use serde::Serialize;
use tracing::debug;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{Device, DeviceCondition, DeviceStatus};

/// Page size used when a request does not carry one
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Filters and paging for a device listing
///
/// Filters are conjunctive; a `None` filter matches everything.
/// A status or condition that names no known value matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceQuery {
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    /// Exact device type
    pub device_type: Option<String>,
    pub status: Option<DeviceStatus>,
    pub condition: Option<DeviceCondition>,
    /// A `key=value` filter whose value names no known variant
    pub unrecognized: Option<String>,
    /// 1-based page number
    pub page: usize,
    /// Records per page, no upper bound
    pub page_size: usize,
}

impl Default for DeviceQuery {
    fn default() -> Self {
        Self {
            search: None,
            device_type: None,
            status: None,
            condition: None,
            unrecognized: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl DeviceQuery {
    /// Create a new empty query (page 1, default page size)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn condition(mut self, condition: DeviceCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Build a query from request-style `key=value` parameters
    ///
    /// Recognized keys are `search`, `type`, `status`, `condition`, `page`
    /// and `limit`. Anything else is ignored, blank values count as absent,
    /// and a `page`/`limit` that is not a positive integer falls back to the
    /// default. A status or condition that is not a known value leaves the
    /// query matching no device.
    pub fn from_params<'a, I>(params: I, default_page_size: usize) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = Self::new().page_size(default_page_size);

        for (key, value) in params {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match key {
                "search" => query.search = Some(value.to_string()),
                "type" => query.device_type = Some(value.to_string()),
                "status" => match value.parse() {
                    Ok(status) => query.status = Some(status),
                    Err(_) => query.unrecognized = Some(format!("status={}", value)),
                },
                "condition" => match value.parse() {
                    Ok(condition) => query.condition = Some(condition),
                    Err(_) => query.unrecognized = Some(format!("condition={}", value)),
                },
                "page" => query.page = positive_or(value, 1),
                "limit" => query.page_size = positive_or(value, default_page_size),
                _ => {}
            }
        }

        if let Some(filter) = &query.unrecognized {
            debug!(filter = %filter, "Unknown filter value, nothing will match");
        }

        query
    }

    /// Check that the paging parameters can produce a page
    pub fn validate(&self) -> InventoryResult<()> {
        if self.page == 0 {
            return Err(InventoryError::Validation("page starts at 1".into()));
        }
        if self.page_size == 0 {
            return Err(InventoryError::Validation(
                "page size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Does `device` satisfy every supplied filter?
    pub fn matches(&self, device: &Device) -> bool {
        if self.unrecognized.is_some() {
            return false;
        }

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() && !device.matches_text(&search.to_lowercase()) {
                return false;
            }
        }

        if let Some(device_type) = &self.device_type {
            if &device.device_type != device_type {
                return false;
            }
        }

        if self.status.is_some_and(|s| s != device.status) {
            return false;
        }

        if self.condition.is_some_and(|c| c != device.condition) {
            return false;
        }

        true
    }

    /// Order the filtered set newest first and cut out the requested page
    pub fn paginate(&self, mut matching: Vec<Device>) -> DevicePage {
        let total = matching.len();
        let total_pages = total.div_ceil(self.page_size.max(1));

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let skip = self.page.saturating_sub(1).saturating_mul(self.page_size);
        let devices = matching
            .into_iter()
            .skip(skip)
            .take(self.page_size)
            .collect();

        DevicePage {
            devices,
            total,
            current_page: self.page,
            total_pages,
        }
    }
}

fn positive_or(value: &str, fallback: usize) -> usize {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => fallback,
    }
}

/// One page of a device listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePage {
    pub devices: Vec<Device>,
    /// Matching records before paging
    pub total: usize,
    pub current_page: usize,
    pub total_pages: usize,
}
