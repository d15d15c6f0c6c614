//! Configuration struct definitions.
//!
//! Every section derives `Default` with the same values as the embedded
//! `defaults.toml`, so a partially specified file still deserializes.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory quotas and sampling cadence.
    pub resources: ResourcesSection,
    /// Messaging bus settings.
    pub messaging: MessagingSection,
    /// Focus manager settings.
    pub focus: FocusSection,
    /// Where to look for app manifests.
    pub apps: AppsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ResourcesSection
// ---------------------------------------------------------------------------

/// Resource quota configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesSection {
    /// Per-app memory limit in bytes.
    pub per_app_memory_limit: u64,
    /// Limit on the sum of all apps' memory in bytes.
    pub aggregate_memory_limit: u64,
    /// Fraction of the per-app limit at which a warning is raised.
    pub warning_ratio: f64,
    /// Memory estimate recorded when an app starts, in bytes.
    pub base_memory_estimate: u64,
    /// Seconds between memory samples.
    pub sample_interval_secs: u64,
}

impl Default for ResourcesSection {
    fn default() -> Self {
        Self {
            per_app_memory_limit: 524_288_000,
            aggregate_memory_limit: 2_147_483_648,
            warning_ratio: 0.8,
            base_memory_estimate: 52_428_800,
            sample_interval_secs: 30,
        }
    }
}

impl ResourcesSection {
    /// Sampling interval as a [`Duration`].
    #[must_use]
    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// MessagingSection
// ---------------------------------------------------------------------------

/// Messaging bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingSection {
    /// Default request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for MessagingSection {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
        }
    }
}

impl MessagingSection {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ---------------------------------------------------------------------------
// FocusSection
// ---------------------------------------------------------------------------

/// Focus manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusSection {
    /// Number of recently focused apps remembered.
    pub history_capacity: usize,
}

impl Default for FocusSection {
    fn default() -> Self {
        Self {
            history_capacity: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AppsSection
// ---------------------------------------------------------------------------

/// Manifest discovery configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppsSection {
    /// Directories whose subdirectories hold app manifests. Later entries
    /// override earlier ones for the same app name.
    pub search_paths: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["mosaic_messaging=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
