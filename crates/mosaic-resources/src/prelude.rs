//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_resources::prelude::*;` to import all essential types.

pub use crate::{MemorySampler, ResourceLimits, ResourceTracker};

pub use crate::{ResourceReport, ResourceUsageRecord, TotalUsage};
