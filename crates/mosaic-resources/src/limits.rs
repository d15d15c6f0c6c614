//! Resource quotas.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 500 MiB.
pub const DEFAULT_PER_APP_MEMORY_LIMIT: u64 = 524_288_000;
/// 2 GiB.
pub const DEFAULT_AGGREGATE_MEMORY_LIMIT: u64 = 2_147_483_648;
/// Fraction of the per-app limit at which a warning is raised.
pub const DEFAULT_WARNING_RATIO: f64 = 0.8;
/// Memory assumed for a freshly launched app before the first sample. 50 MiB.
pub const DEFAULT_BASE_MEMORY_ESTIMATE: u64 = 52_428_800;
/// Period between memory samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);

/// Quotas applied by the [`ResourceTracker`](crate::ResourceTracker).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Memory limit for one app, in bytes.
    pub per_app_memory_limit: u64,
    /// Memory limit across all apps, in bytes.
    pub aggregate_memory_limit: u64,
    /// Warning threshold as a fraction of `per_app_memory_limit`.
    pub warning_ratio: f64,
    /// Initial memory estimate for a newly tracked app, in bytes.
    pub base_memory_estimate: u64,
    /// Period between memory samples.
    #[serde(with = "duration_secs")]
    pub sample_interval: Duration,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            per_app_memory_limit: DEFAULT_PER_APP_MEMORY_LIMIT,
            aggregate_memory_limit: DEFAULT_AGGREGATE_MEMORY_LIMIT,
            warning_ratio: DEFAULT_WARNING_RATIO,
            base_memory_estimate: DEFAULT_BASE_MEMORY_ESTIMATE,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl ResourceLimits {
    /// Memory above which an app is in the warning band.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn warning_threshold(&self) -> u64 {
        let ratio = self.warning_ratio.clamp(0.0, 1.0);
        (self.per_app_memory_limit as f64 * ratio) as u64
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.per_app_memory_limit, 524_288_000);
        assert_eq!(limits.aggregate_memory_limit, 2_147_483_648);
        assert_eq!(limits.base_memory_estimate, 52_428_800);
        assert_eq!(limits.sample_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_warning_threshold() {
        let limits = ResourceLimits {
            per_app_memory_limit: 1_000,
            warning_ratio: 0.8,
            ..ResourceLimits::default()
        };
        assert_eq!(limits.warning_threshold(), 800);
    }
}
