//! Mosaic Events - Typed shell signals for the Mosaic multi-app runtime.
//!
//! This crate provides:
//! - [`ShellEvent`], the closed catalogue of signals the runtime emits
//! - A broadcast-based [`EventBus`] for async consumers
//! - A [`SubscriberRegistry`] for synchronous observers, where registration
//!   returns a [`SubscriberId`] used to unsubscribe
//!
//! The presentation layer and audit collaborators consume these signals; the
//! runtime never reads them back.
//!
//! # Example
//!
//! ```rust
//! use mosaic_core::AppName;
//! use mosaic_events::{EventBus, EventMetadata, ShellEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(ShellEvent::AppLaunched {
//!     metadata: EventMetadata::new("runtime"),
//!     app: AppName::new("notes").unwrap(),
//!     z_order: 3_001,
//! });
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "app_launched");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;
mod subscriber;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{EventMetadata, ShellEvent};
pub use subscriber::{
    EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry,
};
