//! The renderer collaborator.

use std::sync::Arc;

use mosaic_core::ViewHandle;
use thiserror::Error;

use crate::manifest::AppManifestRecord;

/// The renderer could not create a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

impl RenderError {
    /// Create a render error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Creates views for apps.
///
/// Implemented by the host's rendering engine. The returned handle is owned
/// by the app instance; every other holder keeps only a weak reference.
pub trait Renderer: Send + Sync {
    /// Create a view for the app described by `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the entry point cannot be loaded.
    fn create_view(&self, manifest: &AppManifestRecord) -> Result<Arc<dyn ViewHandle>, RenderError>;
}
