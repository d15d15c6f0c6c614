//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_runtime::prelude::*;` to import all essential types.

pub use crate::{AppInstance, AppState, Orchestrator};

pub use crate::{OrchestratorError, OrchestratorResult};

pub use crate::{RenderError, Renderer};

pub use mosaic_apps::{AppManifest, AppManifestRecord};
pub use mosaic_core::{AppName, Endpoint, ViewHandle, WindowType};
pub use mosaic_events::{EventBus, ShellEvent};
pub use mosaic_messaging::{Delivery, Message, MessageBus};
pub use mosaic_permissions::{Category, Enforcer, FsMode, PermissionDenied};
