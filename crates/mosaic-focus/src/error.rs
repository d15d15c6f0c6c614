use mosaic_core::AppName;
use thiserror::Error;

/// Errors from the focus manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FocusError {
    /// The app has no registered surface.
    #[error("app not registered with focus manager: {0}")]
    NotRegistered(AppName),
}

/// Result type for focus operations.
pub type FocusResult<T> = Result<T, FocusError>;
