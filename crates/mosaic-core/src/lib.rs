//! Mosaic Core - Foundation types for the Mosaic multi-app runtime.
//!
//! This crate provides:
//! - Validated app identifiers ([`AppName`]) and message endpoints ([`Endpoint`])
//! - Window types and render layers ([`WindowType`], [`Layer`])
//! - The [`ViewHandle`] contract implemented by the external renderer
//! - Cancelable scheduled callbacks ([`ScheduledTask`])
//!
//! Every other Mosaic crate builds on these types. Nothing here holds state
//! beyond a single value.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod ids;
mod schedule;
mod view;
mod window;

pub use error::{CoreError, CoreResult};
pub use ids::{AppName, Endpoint, MAX_APP_NAME_LEN, RESERVED_SYSTEM_NAME};
pub use schedule::ScheduledTask;
pub use view::ViewHandle;
pub use window::{LAYER_SPAN, Layer, WindowType};
