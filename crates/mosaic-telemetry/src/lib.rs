//! Mosaic Telemetry - Logging for the Mosaic runtime.
//!
//! Every Mosaic crate logs through `tracing` with structured fields. This
//! crate installs the global subscriber: an `EnvFilter` built from a level
//! plus per-crate directives, and one `fmt` layer writing to stdout, stderr
//! or a rolling file.
//!
//! # Example
//!
//! ```rust,no_run
//! use mosaic_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), mosaic_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("mosaic_messaging=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!(app = "calendar", "Launching");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
