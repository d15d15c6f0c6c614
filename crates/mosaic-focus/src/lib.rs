//! Mosaic Focus - Input focus and stacking order.
//!
//! The [`FocusManager`] decides which registered surface owns keyboard
//! focus, remembers a bounded most-recent-last [`FocusHistory`], and hands
//! out z-order values from monotonic per-[`Layer`](mosaic_core::Layer)
//! counters.
//!
//! At most one surface is focused at any time. Only widgets are raised when
//! focused; panels, dialogs and overlays keep their position unless
//! [`FocusManager::bring_to_front`] is called explicitly.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod history;
mod manager;

pub use error::{FocusError, FocusResult};
pub use history::{DEFAULT_HISTORY_CAPACITY, FocusHistory};
pub use manager::{FocusChange, FocusManager};
