//! Per-app enforcement wrapper.

use std::path::Path;
use std::sync::Arc;

use mosaic_core::AppName;

use crate::error::PermissionDenied;
use crate::grant::{ALLOWED_HOSTS, Category, FsMode};
use crate::store::PermissionStore;

/// Checks permissions for a single app and reports denials as errors.
///
/// Obtained from [`PermissionStore::enforcer`]. Every call is audited by the
/// underlying store.
#[derive(Debug, Clone)]
pub struct Enforcer {
    store: Arc<PermissionStore>,
    app: AppName,
}

impl Enforcer {
    pub(crate) fn new(store: Arc<PermissionStore>, app: AppName) -> Self {
        Self { store, app }
    }

    /// The app this enforcer guards.
    #[must_use]
    pub fn app(&self) -> &AppName {
        &self.app
    }

    /// Require a category/action grant.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] if the app lacks the grant.
    pub fn enforce(&self, category: Category, action: &str) -> Result<(), PermissionDenied> {
        if self.store.has_permission(&self.app, category, action) {
            Ok(())
        } else {
            Err(self.denied(category, action, None))
        }
    }

    /// Require access to a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] if the path is outside the granted
    /// prefixes for `mode`.
    pub fn enforce_filesystem(&self, path: impl AsRef<Path>, mode: FsMode) -> Result<(), PermissionDenied> {
        let path = path.as_ref();
        if self.store.check_filesystem_access(&self.app, path, mode) {
            Ok(())
        } else {
            Err(self.denied(
                Category::Filesystem,
                mode.action(),
                Some(path.display().to_string()),
            ))
        }
    }

    /// Require access to a network host.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] if the host is not allow-listed.
    pub fn enforce_network(&self, host: &str) -> Result<(), PermissionDenied> {
        if self.store.check_network_access(&self.app, host) {
            Ok(())
        } else {
            Err(self.denied(Category::Network, ALLOWED_HOSTS, Some(host.to_string())))
        }
    }

    fn denied(&self, category: Category, action: &str, resource: Option<String>) -> PermissionDenied {
        PermissionDenied {
            app: self.app.clone(),
            category,
            action: action.to_string(),
            resource,
        }
    }
}
