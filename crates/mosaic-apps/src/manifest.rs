//! App manifest types.
//!
//! [`AppManifest`] mirrors the JSON file as written. Validation turns it
//! into an [`AppManifestRecord`], the only form the rest of the shell uses.

use mosaic_core::{AppName, WindowType};
use mosaic_permissions::{PermissionGrant, PermissionsDef};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Window placement requested by an app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window type, which also decides the render layer.
    #[serde(rename = "type", default)]
    pub window_type: WindowType,
    /// Preferred width in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Preferred height in logical pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A manifest as parsed from `manifest.json`, before validation.
///
/// Required fields default to empty so that a missing field surfaces as
/// [`RegistryError::InvalidManifest`] rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    /// Unique app name.
    #[serde(default)]
    pub name: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Entry point relative to the app directory.
    #[serde(default)]
    pub entrypoint: String,
    /// Semantic version.
    #[serde(default)]
    pub version: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Window configuration.
    #[serde(default)]
    pub window: WindowConfig,
    /// Requested capabilities.
    #[serde(default)]
    pub permissions: PermissionsDef,
}

impl AppManifest {
    /// Start a manifest with the required fields.
    pub fn new(
        name: impl Into<String>,
        entrypoint: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            entrypoint: entrypoint.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Set the window type.
    #[must_use]
    pub fn with_window_type(mut self, window_type: WindowType) -> Self {
        self.window.window_type = window_type;
        self
    }

    /// Set the requested permissions.
    #[must_use]
    pub fn with_permissions(mut self, permissions: PermissionsDef) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Parse a manifest from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not a manifest object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate into an immutable record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidManifest`] if the name is missing or
    /// not `[a-z0-9-]+`, the entry point is empty, the version is not
    /// semver, or a permission category is unknown.
    pub fn validate(self) -> RegistryResult<AppManifestRecord> {
        let invalid = |reason: String| RegistryError::InvalidManifest {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(invalid("name is required".into()));
        }
        let name = AppName::new(self.name.as_str()).map_err(|e| invalid(e.to_string()))?;

        if self.entrypoint.trim().is_empty() {
            return Err(invalid("entrypoint is required".into()));
        }
        if self.version.is_empty() {
            return Err(invalid("version is required".into()));
        }
        let version = Version::parse(&self.version)
            .map_err(|e| invalid(format!("version '{}' is not semver: {e}", self.version)))?;

        let grant = PermissionGrant::from_def(&self.permissions).map_err(|e| invalid(e.to_string()))?;

        let display_name = self
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());

        Ok(AppManifestRecord {
            name,
            display_name,
            version,
            entrypoint: self.entrypoint,
            description: self.description,
            window: self.window,
            permissions: self.permissions,
            grant,
        })
    }
}

impl TryFrom<AppManifest> for AppManifestRecord {
    type Error = RegistryError;

    fn try_from(manifest: AppManifest) -> RegistryResult<Self> {
        manifest.validate()
    }
}

/// A validated, immutable app manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifestRecord {
    name: AppName,
    display_name: String,
    version: Version,
    entrypoint: String,
    description: Option<String>,
    window: WindowConfig,
    permissions: PermissionsDef,
    grant: PermissionGrant,
}

impl AppManifestRecord {
    /// The app's unique name.
    #[must_use]
    pub fn name(&self) -> &AppName {
        &self.name
    }

    /// Human-readable name; falls back to the app name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Parsed version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Entry point handed to the renderer.
    #[must_use]
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Window configuration.
    #[must_use]
    pub fn window(&self) -> &WindowConfig {
        &self.window
    }

    /// Shorthand for `window().window_type`.
    #[must_use]
    pub fn window_type(&self) -> WindowType {
        self.window.window_type
    }

    /// The permissions table as declared.
    #[must_use]
    pub fn permissions(&self) -> &PermissionsDef {
        &self.permissions
    }

    /// Grants derived from the permissions table.
    #[must_use]
    pub fn grant(&self) -> &PermissionGrant {
        &self.grant
    }
}
