//! Append-only audit trail of permission checks.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use mosaic_core::AppName;
use serde::{Deserialize, Serialize};

use crate::grant::Category;

/// One recorded permission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The app that was checked.
    pub app: AppName,
    /// Category of the check.
    pub category: Category,
    /// What was accessed: the category name, a path, or a host.
    pub resource: String,
    /// The action requested.
    pub action: String,
    /// Whether access was granted.
    pub granted: bool,
    /// When the check happened.
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub(crate) fn new(
        app: &AppName,
        category: Category,
        resource: impl Into<String>,
        action: impl Into<String>,
        granted: bool,
    ) -> Self {
        Self {
            app: app.clone(),
            category,
            resource: resource.into(),
            action: action.into(),
            granted,
            timestamp: Utc::now(),
        }
    }
}

/// In-memory log. Appending never fails: a poisoned lock is recovered.
#[derive(Debug, Default)]
pub(crate) struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub(crate) fn append(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub(crate) fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn snapshot_for(&self, app: &AppName) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| &e.app == app)
            .cloned()
            .collect()
    }
}
