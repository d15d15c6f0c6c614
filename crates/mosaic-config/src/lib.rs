//! Mosaic Config - Layered configuration for the Mosaic runtime.
//!
//! A single [`Config`] type covers resource quotas, messaging, focus,
//! manifest discovery and logging.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mosaic_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("per-app limit: {}", resolved.config.resources.per_app_memory_limit);
//! ```
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **User file** (explicit path, or `config.toml` in the platform config
//!    directory for `mosaic`)
//! 2. **Environment variables** (`MOSAIC_LOG_LEVEL`,
//!    `MOSAIC_REQUEST_TIMEOUT_MS`), applied only where the file is silent
//! 3. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! # Design
//!
//! This crate has no dependencies on other Mosaic crates. Conversion to
//! domain types such as resource limits happens where the runtime is built.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Environment variable fallbacks.
pub mod env;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered merging of TOML trees.
pub mod merge;
/// Configuration validation rules.
pub mod validate;

mod error;
mod types;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_NAME, ResolvedConfig, default_config_path};
pub use merge::ConfigLayer;
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// See [`loader::load`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or the final
    /// configuration fails validation.
    pub fn load(user_config: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(user_config)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::ValidationError`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
