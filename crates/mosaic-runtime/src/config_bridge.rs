//! Bridge from `mosaic_config::Config` to domain types.
//!
//! The config crate depends on no other Mosaic crate. Conversion to the
//! types the services take happens here, once.

use mosaic_config::{Config, ResourcesSection};
use mosaic_resources::ResourceLimits;
use mosaic_telemetry::{LogConfig, TelemetryResult};

/// Convert the `[resources]` section to [`ResourceLimits`].
#[must_use]
pub fn to_resource_limits(section: &ResourcesSection) -> ResourceLimits {
    ResourceLimits {
        per_app_memory_limit: section.per_app_memory_limit,
        aggregate_memory_limit: section.aggregate_memory_limit,
        warning_ratio: section.warning_ratio,
        base_memory_estimate: section.base_memory_estimate,
        sample_interval: section.sample_interval(),
    }
}

/// Convert the `[logging]` section to a [`LogConfig`].
///
/// # Errors
///
/// Returns an error if the format is not recognised.
pub fn to_log_config(config: &Config) -> TelemetryResult<LogConfig> {
    LogConfig::try_from(&config.logging)
}
