//! Usage records and reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mosaic_core::AppName;
use serde::{Deserialize, Serialize};

use crate::limits::ResourceLimits;

/// Usage accounted to one app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsageRecord {
    /// Latest memory estimate in bytes.
    pub memory_estimate_bytes: u64,
    /// Network requests made since launch.
    pub network_requests: u64,
    /// Storage attributed to the app, in bytes.
    pub storage_bytes: u64,
    /// When tracking started.
    pub start_time: DateTime<Utc>,
    /// When memory was last sampled.
    pub last_sampled: Option<DateTime<Utc>>,
    /// Whether the app is currently in the warning band.
    pub warned: bool,
    /// Whether the app is currently above its limit.
    pub exceeded: bool,
}

impl ResourceUsageRecord {
    pub(crate) fn new(base_memory_estimate: u64) -> Self {
        Self {
            memory_estimate_bytes: base_memory_estimate,
            network_requests: 0,
            storage_bytes: 0,
            start_time: Utc::now(),
            last_sampled: None,
            warned: false,
            exceeded: false,
        }
    }
}

/// Totals across all tracked apps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalUsage {
    /// Sum of memory estimates in bytes.
    pub memory_bytes: u64,
    /// Sum of network requests.
    pub network_requests: u64,
    /// Sum of storage in bytes.
    pub storage_bytes: u64,
}

impl TotalUsage {
    pub(crate) fn sum<'a>(records: impl IntoIterator<Item = &'a ResourceUsageRecord>) -> Self {
        records.into_iter().fold(Self::default(), |acc, r| Self {
            memory_bytes: acc.memory_bytes.saturating_add(r.memory_estimate_bytes),
            network_requests: acc.network_requests.saturating_add(r.network_requests),
            storage_bytes: acc.storage_bytes.saturating_add(r.storage_bytes),
        })
    }
}

/// Serializable snapshot of all usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    /// Per-app usage, ordered by name.
    pub apps: BTreeMap<AppName, ResourceUsageRecord>,
    /// Totals across all apps.
    pub totals: TotalUsage,
    /// Limits in force.
    pub limits: ResourceLimits,
    /// Whether the aggregate memory limit is currently exceeded.
    pub aggregate_exceeded: bool,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
}
