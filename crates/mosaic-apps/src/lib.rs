//! Mosaic Apps - Manifests and the app registry.
//!
//! An app is described by a `manifest.json` next to its entry point. This
//! crate parses and validates manifests into immutable
//! [`AppManifestRecord`]s, keeps them in an [`AppRegistry`] keyed by
//! [`AppName`](mosaic_core::AppName), and discovers manifests on disk.
//! The [`Renderer`] trait is the seam to the host's view engine.
//!
//! ```json
//! {
//!   "name": "calendar",
//!   "displayName": "Calendar",
//!   "entrypoint": "main.qml",
//!   "version": "1.2.0",
//!   "window": { "type": "widget", "width": 320, "height": 240 },
//!   "permissions": { "calendar": { "read": true } }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod discovery;
mod error;
mod manifest;
mod registry;
mod render;

pub use discovery::{Discovery, MANIFEST_FILE_NAME, discover_manifests, load_manifest};
pub use error::{RegistryError, RegistryResult};
pub use manifest::{AppManifest, AppManifestRecord, WindowConfig};
pub use registry::AppRegistry;
pub use render::{RenderError, Renderer};
