//! App identifiers and message endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The reserved identity of the shell itself.
///
/// Apps may never register under this name; it is represented by
/// [`Endpoint::System`] instead.
pub const RESERVED_SYSTEM_NAME: &str = "system";

/// Maximum length of an app name in bytes.
pub const MAX_APP_NAME_LEN: usize = 64;

/// Unique, stable, human-readable app identifier.
///
/// Names are lowercase ASCII alphanumerics and hyphens (`[a-z0-9-]+`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AppName(String);

impl<'de> Deserialize<'de> for AppName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl AppName {
    /// Create a validated app name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidName`] if the name is empty, too long,
    /// contains characters outside `[a-z0-9-]`, or is the reserved `system`.
    pub fn new(name: impl Into<String>) -> CoreResult<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> CoreResult<()> {
        let reject = |reason: &str| {
            Err(CoreError::InvalidName {
                name: name.to_string(),
                reason: reason.to_string(),
            })
        };

        if name.is_empty() {
            return reject("must not be empty");
        }
        if name.len() > MAX_APP_NAME_LEN {
            return reject("too long");
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return reject("must contain only lowercase alphanumeric characters and hyphens");
        }
        if name == RESERVED_SYSTEM_NAME {
            return reject("'system' is reserved for the shell");
        }
        Ok(())
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for AppName {
    type Error = CoreError;

    fn try_from(value: &str) -> CoreResult<Self> {
        Self::new(value)
    }
}

/// A sender or recipient on the messaging bus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// The shell itself.
    System,
    /// A registered app.
    App(AppName),
}

impl Endpoint {
    /// The app name, if this endpoint is an app.
    #[must_use]
    pub fn app(&self) -> Option<&AppName> {
        match self {
            Self::System => None,
            Self::App(name) => Some(name),
        }
    }

    /// Whether this is the shell endpoint.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl From<AppName> for Endpoint {
    fn from(name: AppName) -> Self {
        Self::App(name)
    }
}

impl From<&AppName> for Endpoint {
    fn from(name: &AppName) -> Self {
        Self::App(name.clone())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str(RESERVED_SYSTEM_NAME),
            Self::App(name) => name.fmt(f),
        }
    }
}
