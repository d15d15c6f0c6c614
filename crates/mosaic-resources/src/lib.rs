//! Mosaic Resources - Per-app resource accounting.
//!
//! The [`ResourceTracker`] keeps one [`ResourceUsageRecord`] per running app,
//! samples memory periodically through an injected [`MemorySampler`], and
//! publishes quota signals on the shell [`EventBus`](mosaic_events::EventBus).
//!
//! Quotas are advisory: the tracker reports crossings and never stops an
//! app. Each signal fires once per upward crossing and re-arms when usage
//! falls back below the threshold.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod limits;
mod tracker;
mod usage;

pub use limits::{
    DEFAULT_AGGREGATE_MEMORY_LIMIT, DEFAULT_BASE_MEMORY_ESTIMATE, DEFAULT_PER_APP_MEMORY_LIMIT,
    DEFAULT_SAMPLE_INTERVAL, DEFAULT_WARNING_RATIO, ResourceLimits,
};
pub use tracker::{MEMORY_RESOURCE, MemorySampler, ResourceTracker};
pub use usage::{ResourceReport, ResourceUsageRecord, TotalUsage};
