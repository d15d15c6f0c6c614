//! Mosaic Runtime - Lifecycle orchestration for concurrently running apps.
//!
//! The [`Orchestrator`] composes every Mosaic service:
//!
//! - the app registry and permission store, fed from manifests
//! - the renderer that creates each app's view
//! - the focus manager for focus, history and z-order
//! - the resource tracker sampling each view's memory
//! - the messaging bus, used to tell apps they were paused, resumed or are
//!   about to close
//!
//! Every state change is published on the [`EventBus`](mosaic_events::EventBus)
//! as a [`ShellEvent`](mosaic_events::ShellEvent).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mosaic_runtime::prelude::*;
//!
//! let mut orchestrator = Orchestrator::new(Arc::new(my_renderer));
//! orchestrator.register_manifest(AppManifest::new("notes", "notes/main.qml", "1.0.0"))?;
//!
//! let notes = AppName::new("notes")?;
//! orchestrator.launch_app(&notes)?;
//! assert_eq!(orchestrator.focused_app(), Some(&notes));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

pub mod config_bridge;
pub mod prelude;

mod error;
mod instance;
mod orchestrator;

pub use error::{OrchestratorError, OrchestratorResult};
pub use instance::{AppInstance, AppState};
pub use orchestrator::{Orchestrator, PAUSED_MESSAGE, RESUMED_MESSAGE, WILL_CLOSE_MESSAGE};

pub use mosaic_apps::{RenderError, Renderer};
