use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or registering app manifests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The manifest is missing required fields or has invalid values.
    #[error("invalid manifest for '{name}': {reason}")]
    InvalidManifest {
        /// The name as written in the manifest (may be empty).
        name: String,
        /// What was wrong.
        reason: String,
    },

    /// No app is registered under this name.
    #[error("app not found: {0}")]
    NotFound(String),

    /// The manifest file could not be read.
    #[error("failed to read manifest at {path}: {message}")]
    ManifestRead {
        /// Path to the manifest.
        path: PathBuf,
        /// The I/O error message.
        message: String,
    },

    /// The manifest file is not valid JSON for a manifest.
    #[error("failed to parse manifest at {path}: {message}")]
    ManifestParse {
        /// Path to the manifest.
        path: PathBuf,
        /// The parse error message.
        message: String,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
