//! App registry.
//!
//! Holds one validated manifest per app name. The registry knows nothing
//! about running instances; refusing to unregister a live app is the
//! orchestrator's job.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use mosaic_core::AppName;
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::manifest::{AppManifest, AppManifestRecord};

/// Registry of known apps, keyed by name.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: BTreeMap<AppName, AppManifestRecord>,
}

impl AppRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a manifest, replacing any previous record
    /// with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidManifest`] if validation fails. The
    /// registry is unchanged in that case.
    pub fn register(&mut self, manifest: AppManifest) -> RegistryResult<&AppManifestRecord> {
        let record = manifest.validate()?;
        Ok(self.insert(record))
    }

    /// Register an already validated record, replacing any previous one.
    pub fn insert(&mut self, record: AppManifestRecord) -> &AppManifestRecord {
        match self.apps.entry(record.name().clone()) {
            Entry::Occupied(mut slot) => {
                let previous = slot.insert(record);
                info!(
                    app = %slot.key(),
                    previous_version = %previous.version(),
                    "Replaced app manifest"
                );
                slot.into_mut()
            },
            Entry::Vacant(slot) => {
                info!(app = %slot.key(), "Registered app");
                slot.insert(record)
            },
        }
    }

    /// Remove an app, returning its record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no such app is registered.
    pub fn unregister(&mut self, name: &AppName) -> RegistryResult<AppManifestRecord> {
        let record = self
            .apps
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        info!(app = %name, "Unregistered app");
        Ok(record)
    }

    /// Look up an app's record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no such app is registered.
    pub fn get(&self, name: &AppName) -> RegistryResult<&AppManifestRecord> {
        self.apps.get(name).ok_or_else(|| {
            debug!(app = %name, "Manifest lookup missed");
            RegistryError::NotFound(name.to_string())
        })
    }

    /// All records, ordered by name.
    #[must_use]
    pub fn list(&self) -> Vec<&AppManifestRecord> {
        self.apps.values().collect()
    }

    /// Whether an app is registered.
    #[must_use]
    pub fn contains(&self, name: &AppName) -> bool {
        self.apps.contains_key(name)
    }

    /// Number of registered apps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}
