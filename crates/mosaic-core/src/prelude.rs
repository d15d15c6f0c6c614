//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_core::prelude::*;` to import all essential types.

// Identifiers
pub use crate::{AppName, Endpoint};

// Windows and layers
pub use crate::{Layer, ViewHandle, WindowType};

// Scheduling
pub use crate::ScheduledTask;

// Errors
pub use crate::{CoreError, CoreResult};
