//! Test fixtures for common types.

use mosaic_apps::AppManifest;
use mosaic_core::{AppName, WindowType};
use mosaic_permissions::PermissionsDef;

/// Create a test app name.
///
/// # Panics
///
/// Panics if `name` is not a valid app name.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_app_name(name: &str) -> AppName {
    AppName::new(name).expect("valid test app name")
}

/// A minimal valid widget manifest.
#[must_use]
pub fn test_manifest(name: &str) -> AppManifest {
    AppManifest::new(name, format!("{name}/main.qml"), "1.0.0").with_display_name(name)
}

/// A minimal valid manifest with the given window type.
#[must_use]
pub fn test_manifest_with(name: &str, window_type: WindowType) -> AppManifest {
    test_manifest(name).with_window_type(window_type)
}

/// A manifest requesting calendar access, a filesystem scope and one host.
///
/// # Panics
///
/// Panics if the embedded permission table fails to parse.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_calendar_manifest() -> AppManifest {
    let permissions: PermissionsDef = serde_json::from_value(serde_json::json!({
        "calendar": { "read": true, "write": true },
        "filesystem": { "read": ["/home/user/calendars"] },
        "network": { "allowedHosts": ["caldav.example.com"] },
        "notifications": { "post": true }
    }))
    .expect("valid permission table");

    test_manifest("calendar")
        .with_display_name("Calendar")
        .with_permissions(permissions)
}

/// The JSON text of a valid manifest, for discovery tests.
#[must_use]
pub fn test_manifest_json(name: &str) -> String {
    serde_json::json!({
        "name": name,
        "displayName": name,
        "entrypoint": "main.qml",
        "version": "1.0.0",
        "window": { "type": "widget" }
    })
    .to_string()
}
