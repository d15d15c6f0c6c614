//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_focus::prelude::*;` to import all essential types.

pub use crate::{FocusChange, FocusError, FocusHistory, FocusManager, FocusResult};
