//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_apps::prelude::*;` to import all essential types.

pub use crate::{AppManifest, AppManifestRecord, AppRegistry, WindowConfig};

pub use crate::{RenderError, Renderer};

pub use crate::{Discovery, discover_manifests, load_manifest};

pub use crate::{RegistryError, RegistryResult};
