//! Permission error types.

use mosaic_core::AppName;
use thiserror::Error;

use crate::grant::Category;

/// A privileged operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied: '{app}' lacks {category}.{action}{}", resource_suffix(.resource.as_deref()))]
pub struct PermissionDenied {
    /// The app that attempted the operation.
    pub app: AppName,
    /// The capability category.
    pub category: Category,
    /// The action within the category.
    pub action: String,
    /// The concrete resource (path or host), when scoped.
    pub resource: Option<String>,
}

fn resource_suffix(resource: Option<&str>) -> String {
    resource.map(|r| format!(" for '{r}'")).unwrap_or_default()
}

/// A manifest `permissions` table could not be turned into a grant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    /// The category is not one the shell knows about.
    #[error("unknown permission category '{0}'")]
    UnknownCategory(String),
}
