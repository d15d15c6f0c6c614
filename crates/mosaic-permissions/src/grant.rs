//! Permission grants and their manifest representation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GrantError;

/// Action name under [`Category::Network`] holding the host allow-list.
pub const ALLOWED_HOSTS: &str = "allowedHosts";

/// Capability category an app may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Calendar data.
    Calendar,
    /// Filesystem paths, scoped by prefix.
    Filesystem,
    /// Network hosts, scoped by allow-list.
    Network,
    /// Desktop notifications.
    Notifications,
    /// Spawning processes.
    Processes,
    /// Clipboard access.
    Clipboard,
}

impl Category {
    /// All categories.
    pub const ALL: [Self; 6] = [
        Self::Calendar,
        Self::Filesystem,
        Self::Network,
        Self::Notifications,
        Self::Processes,
        Self::Clipboard,
    ];

    /// The manifest key for this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Filesystem => "filesystem",
            Self::Network => "network",
            Self::Notifications => "notifications",
            Self::Processes => "processes",
            Self::Clipboard => "clipboard",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GrantError::UnknownCategory(s.to_string()))
    }
}

/// Filesystem access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsMode {
    /// Read access (`filesystem.read`).
    Read,
    /// Write access (`filesystem.write`).
    Write,
}

impl FsMode {
    /// The action name under [`Category::Filesystem`].
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for FsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// The value granted for a single action.
///
/// In a manifest this is either a boolean or a list of scopes:
///
/// ```json
/// { "calendar": { "read": true }, "network": { "allowedHosts": ["api.example.com"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionGrant {
    /// Plain on/off grant.
    Allowed(bool),
    /// Grant limited to the listed scopes (path prefixes or hosts).
    Scoped(Vec<String>),
}

impl ActionGrant {
    /// Whether this grant permits the action at all.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        match self {
            Self::Allowed(allowed) => *allowed,
            Self::Scoped(scopes) => !scopes.is_empty(),
        }
    }

    /// The scope list, empty for boolean grants.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        match self {
            Self::Allowed(_) => &[],
            Self::Scoped(scopes) => scopes,
        }
    }
}

/// The raw `permissions` table of a manifest: `category → action → grant`.
pub type PermissionsDef = BTreeMap<String, BTreeMap<String, ActionGrant>>;

/// The validated set of grants held by one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    categories: BTreeMap<Category, BTreeMap<String, ActionGrant>>,
}

impl PermissionGrant {
    /// An empty grant set; every check against it is denied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build grants from a manifest `permissions` table.
    ///
    /// # Errors
    ///
    /// Returns [`GrantError::UnknownCategory`] for a category the shell
    /// does not recognise.
    pub fn from_def(def: &PermissionsDef) -> Result<Self, GrantError> {
        let mut categories = BTreeMap::new();
        for (key, actions) in def {
            let category: Category = key.parse()?;
            categories.insert(category, actions.clone());
        }
        Ok(Self { categories })
    }

    /// Allow a boolean action.
    #[must_use]
    pub fn allow(self, category: Category, action: impl Into<String>) -> Self {
        self.with(category, action, ActionGrant::Allowed(true))
    }

    /// Grant an action limited to the given scopes.
    #[must_use]
    pub fn scope<I, S>(self, category: Category, action: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scopes = scopes.into_iter().map(Into::into).collect();
        self.with(category, action, ActionGrant::Scoped(scopes))
    }

    /// Set an arbitrary grant for an action, replacing any previous one.
    #[must_use]
    pub fn with(mut self, category: Category, action: impl Into<String>, grant: ActionGrant) -> Self {
        self.categories
            .entry(category)
            .or_default()
            .insert(action.into(), grant);
        self
    }

    /// Look up the grant for an action.
    #[must_use]
    pub fn get(&self, category: Category, action: &str) -> Option<&ActionGrant> {
        self.categories.get(&category)?.get(action)
    }

    /// Whether the action is granted. Absent entries are denied.
    #[must_use]
    pub fn permits(&self, category: Category, action: &str) -> bool {
        self.get(category, action)
            .is_some_and(ActionGrant::is_granted)
    }

    /// Scopes granted for an action, empty when absent or boolean.
    #[must_use]
    pub fn scopes(&self, category: Category, action: &str) -> &[String] {
        self.get(category, action)
            .map_or(&[][..], ActionGrant::scopes)
    }

    /// Categories with at least one entry.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.keys().copied()
    }

    /// Whether no category is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
