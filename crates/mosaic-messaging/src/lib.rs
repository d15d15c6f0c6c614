//! Mosaic Messaging - Point-to-point and broadcast messaging between apps.
//!
//! The [`MessageBus`] routes [`Message`]s between [`Endpoint`]s:
//!
//! - Delivery is synchronous when the recipient has a handler.
//! - Without a handler, messages wait in a per-recipient FIFO queue that is
//!   flushed exactly once when a handler registers.
//! - [`MessageBus::send_request`] correlates a `"<kind>:response"` reply by
//!   request id and resolves a callback with the reply or a timeout.
//!
//! Handler failures never reach the sender; they are reported as
//! [`Delivery::Failed`] and a `MessageFailed` signal.
//!
//! [`Endpoint`]: mosaic_core::Endpoint

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod error;
mod message;

pub use bus::{
    DEFAULT_REQUEST_TIMEOUT, Delivery, MessageBus, MessageHandler, ResponseCallback,
};
pub use error::{HandlerError, RequestError};
pub use message::{Message, RESPONSE_SUFFIX, response_kind};
