//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_permissions::prelude::*;` to import all essential types.

// Grants
pub use crate::{ActionGrant, Category, FsMode, PermissionGrant, PermissionsDef};

// Store and enforcement
pub use crate::{Enforcer, PermissionStore};

// Audit
pub use crate::AuditEntry;

// Errors
pub use crate::{GrantError, PermissionDenied};
