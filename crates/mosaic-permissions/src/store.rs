//! Per-app permission storage and checks.

use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::{Arc, PoisonError, RwLock};

use mosaic_core::AppName;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::enforcer::Enforcer;
use crate::grant::{ALLOWED_HOSTS, Category, FsMode, PermissionGrant};

/// Default-deny permission store.
///
/// Holds one [`PermissionGrant`] per app and records every check in an
/// append-only audit log.
#[derive(Debug, Default)]
pub struct PermissionStore {
    grants: RwLock<HashMap<AppName, PermissionGrant>>,
    audit: AuditLog,
}

impl PermissionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an app's grants, replacing any previous set.
    pub fn register_app(&self, app: AppName, grant: PermissionGrant) {
        debug!(app = %app, categories = ?grant.categories().collect::<Vec<_>>(), "Registering permissions");
        self.grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(app, grant);
    }

    /// Remove an app's grants.
    ///
    /// Returns `true` if the app had grants.
    pub fn revoke_app(&self, app: &AppName) -> bool {
        let removed = self
            .grants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(app)
            .is_some();
        if removed {
            debug!(app = %app, "Revoked permissions");
        }
        removed
    }

    /// Whether grants are registered for the app.
    #[must_use]
    pub fn is_registered(&self, app: &AppName) -> bool {
        self.grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(app)
    }

    /// A copy of the app's current grants.
    #[must_use]
    pub fn grant(&self, app: &AppName) -> Option<PermissionGrant> {
        self.grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(app)
            .cloned()
    }

    /// Check a category/action pair.
    ///
    /// `false` when the app, category or action is unknown.
    pub fn has_permission(&self, app: &AppName, category: Category, action: &str) -> bool {
        let granted = self.with_grant(app, |g| g.permits(category, action));
        self.record(app, category, category.as_str(), action, granted);
        granted
    }

    /// Check access to a filesystem path.
    ///
    /// Granted only when the path lies under one of the prefixes listed in
    /// `filesystem.read` or `filesystem.write`. Paths with `..` components
    /// are always denied.
    pub fn check_filesystem_access(&self, app: &AppName, path: impl AsRef<Path>, mode: FsMode) -> bool {
        let path = path.as_ref();
        let granted = !has_parent_component(path)
            && self.with_grant(app, |g| {
                g.scopes(Category::Filesystem, mode.action())
                    .iter()
                    .any(|prefix| path.starts_with(prefix))
            });
        self.record(
            app,
            Category::Filesystem,
            path.display().to_string(),
            mode.action(),
            granted,
        );
        granted
    }

    /// Check access to a network host.
    ///
    /// Granted only on an exact (ASCII case-insensitive) match against
    /// `network.allowedHosts`.
    pub fn check_network_access(&self, app: &AppName, host: &str) -> bool {
        let granted = self.with_grant(app, |g| {
            g.scopes(Category::Network, ALLOWED_HOSTS)
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
        });
        self.record(app, Category::Network, host, ALLOWED_HOSTS, granted);
        granted
    }

    /// Every audit entry recorded so far, oldest first.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.audit.snapshot()
    }

    /// Audit entries for one app, oldest first.
    #[must_use]
    pub fn audit_log_for(&self, app: &AppName) -> Vec<AuditEntry> {
        self.audit.snapshot_for(app)
    }

    /// Create an [`Enforcer`] bound to one app.
    #[must_use]
    pub fn enforcer(self: &Arc<Self>, app: AppName) -> Enforcer {
        Enforcer::new(Arc::clone(self), app)
    }

    fn with_grant(&self, app: &AppName, check: impl FnOnce(&PermissionGrant) -> bool) -> bool {
        self.grants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(app)
            .is_some_and(check)
    }

    fn record(
        &self,
        app: &AppName,
        category: Category,
        resource: impl Into<String>,
        action: &str,
        granted: bool,
    ) {
        let entry = AuditEntry::new(app, category, resource, action, granted);
        if granted {
            debug!(app = %app, category = %category, resource = %entry.resource, action, "Permission granted");
        } else {
            warn!(app = %app, category = %category, resource = %entry.resource, action, "Permission denied");
        }
        self.audit.append(entry);
    }
}

fn has_parent_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str) -> AppName {
        AppName::new(name).unwrap()
    }

    fn store_with(name: &str, grant: PermissionGrant) -> PermissionStore {
        let store = PermissionStore::new();
        store.register_app(app(name), grant);
        store
    }

    #[test]
    fn test_unknown_app_is_denied() {
        let store = PermissionStore::new();
        assert!(!store.has_permission(&app("ghost"), Category::Calendar, "read"));
    }

    #[test]
    fn test_has_permission() {
        let store = store_with(
            "calendar",
            PermissionGrant::new().allow(Category::Calendar, "read"),
        );
        let calendar = app("calendar");

        assert!(store.has_permission(&calendar, Category::Calendar, "read"));
        assert!(!store.has_permission(&calendar, Category::Calendar, "write"));
        assert!(!store.has_permission(&calendar, Category::Clipboard, "read"));
    }

    #[test]
    fn test_register_replaces_previous_grants() {
        let store = store_with("notes", PermissionGrant::new().allow(Category::Clipboard, "read"));
        let notes = app("notes");
        store.register_app(notes.clone(), PermissionGrant::new().allow(Category::Notifications, "post"));

        assert!(!store.has_permission(&notes, Category::Clipboard, "read"));
        assert!(store.has_permission(&notes, Category::Notifications, "post"));
    }

    #[test]
    fn test_revoke_app() {
        let store = store_with("notes", PermissionGrant::new().allow(Category::Clipboard, "read"));
        let notes = app("notes");

        assert!(store.revoke_app(&notes));
        assert!(!store.revoke_app(&notes));
        assert!(!store.is_registered(&notes));
        assert!(!store.has_permission(&notes, Category::Clipboard, "read"));
    }

    #[test]
    fn test_filesystem_prefix_is_component_wise() {
        let store = store_with(
            "editor",
            PermissionGrant::new()
                .scope(Category::Filesystem, "read", ["/home/user/docs"])
                .scope(Category::Filesystem, "write", ["/tmp/editor"]),
        );
        let editor = app("editor");

        assert!(store.check_filesystem_access(&editor, "/home/user/docs", FsMode::Read));
        assert!(store.check_filesystem_access(&editor, "/home/user/docs/a/b.txt", FsMode::Read));
        assert!(!store.check_filesystem_access(&editor, "/home/user/docs-private/x", FsMode::Read));
        assert!(!store.check_filesystem_access(&editor, "/home/user/docs/a.txt", FsMode::Write));
        assert!(store.check_filesystem_access(&editor, "/tmp/editor/out.txt", FsMode::Write));
    }

    #[test]
    fn test_filesystem_parent_components_denied() {
        let store = store_with(
            "editor",
            PermissionGrant::new().scope(Category::Filesystem, "read", ["/home/user/docs"]),
        );
        assert!(!store.check_filesystem_access(
            &app("editor"),
            "/home/user/docs/../.ssh/id_ed25519",
            FsMode::Read
        ));
    }

    #[test]
    fn test_network_host_match() {
        let store = store_with(
            "weather",
            PermissionGrant::new().scope(Category::Network, ALLOWED_HOSTS, ["api.weather.example"]),
        );
        let weather = app("weather");

        assert!(store.check_network_access(&weather, "api.weather.example"));
        assert!(store.check_network_access(&weather, "API.Weather.Example"));
        assert!(!store.check_network_access(&weather, "evil.example"));
        assert!(!store.check_network_access(&weather, "sub.api.weather.example"));
    }

    #[test]
    fn test_audit_records_granted_and_denied() {
        let store = store_with("notes", PermissionGrant::new().allow(Category::Clipboard, "read"));
        let notes = app("notes");
        let other = app("other");

        store.has_permission(&notes, Category::Clipboard, "read");
        store.has_permission(&notes, Category::Clipboard, "write");
        store.check_network_access(&other, "example.com");

        let log = store.audit_log();
        assert_eq!(log.len(), 3);
        assert!(log[0].granted);
        assert!(!log[1].granted);
        assert_eq!(log[1].action, "write");
        assert_eq!(log[2].resource, "example.com");

        let notes_log = store.audit_log_for(&notes);
        assert_eq!(notes_log.len(), 2);
        assert!(notes_log.iter().all(|e| e.app == notes));
    }
}
