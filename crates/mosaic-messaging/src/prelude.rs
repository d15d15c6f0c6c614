//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_messaging::prelude::*;` to import all essential types.

pub use crate::{Delivery, Message, MessageBus, MessageHandler, ResponseCallback};

pub use crate::{HandlerError, RequestError};
