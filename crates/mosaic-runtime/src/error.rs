//! Orchestrator error types.

use mosaic_apps::RegistryError;
use mosaic_core::AppName;
use mosaic_focus::FocusError;
use thiserror::Error;

/// Errors returned by the [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No manifest is registered under this name.
    #[error("App not found: {0}")]
    AppNotFound(AppName),

    /// The operation needs the app to be stopped.
    #[error("App is running: {0}")]
    AlreadyRunning(AppName),

    /// The renderer could not create the app's view.
    #[error("Failed to launch {app}: {reason}")]
    LaunchFailed {
        /// The app.
        app: AppName,
        /// Renderer error message.
        reason: String,
    },

    /// The manifest failed validation.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[from] RegistryError),

    /// Focus bookkeeping disagrees with the running set.
    #[error("Focus error: {0}")]
    Focus(#[from] FocusError),
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
