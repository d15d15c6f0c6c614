//! Post-merge configuration validation.
//!
//! Checks that values are in range and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Accepted log levels.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
/// Accepted log formats.
pub const LOG_FORMATS: [&str; 4] = ["pretty", "compact", "json", "full"];

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_resources(config)?;
    validate_messaging(config)?;
    validate_focus(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_resources(config: &Config) -> ConfigResult<()> {
    let r = &config.resources;

    if r.per_app_memory_limit == 0 {
        return Err(invalid(
            "resources.per_app_memory_limit",
            "per_app_memory_limit must be positive",
        ));
    }

    if r.aggregate_memory_limit == 0 {
        return Err(invalid(
            "resources.aggregate_memory_limit",
            "aggregate_memory_limit must be positive",
        ));
    }

    if r.per_app_memory_limit > r.aggregate_memory_limit {
        return Err(invalid(
            "resources.per_app_memory_limit",
            format!(
                "per_app_memory_limit ({}) must not exceed aggregate_memory_limit ({})",
                r.per_app_memory_limit, r.aggregate_memory_limit
            ),
        ));
    }

    if !r.warning_ratio.is_finite() || r.warning_ratio <= 0.0 || r.warning_ratio > 1.0 {
        return Err(invalid(
            "resources.warning_ratio",
            format!(
                "warning_ratio {} is out of range; must be greater than 0.0 and at most 1.0",
                r.warning_ratio
            ),
        ));
    }

    if r.sample_interval_secs == 0 {
        return Err(invalid(
            "resources.sample_interval_secs",
            "sample_interval_secs must be at least 1",
        ));
    }

    Ok(())
}

fn validate_messaging(config: &Config) -> ConfigResult<()> {
    if config.messaging.request_timeout_ms == 0 {
        return Err(invalid(
            "messaging.request_timeout_ms",
            "request_timeout_ms must be at least 1",
        ));
    }
    Ok(())
}

fn validate_focus(config: &Config) -> ConfigResult<()> {
    if config.focus.history_capacity == 0 {
        return Err(invalid(
            "focus.history_capacity",
            "history_capacity must be at least 1",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}
