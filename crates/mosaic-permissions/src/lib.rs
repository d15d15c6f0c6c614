//! Mosaic Permissions - Capability grants for Mosaic apps.
//!
//! This crate provides:
//! - [`PermissionGrant`]: per-app `category → action → grant` maps built
//!   from the manifest's `permissions` table
//! - [`PermissionStore`]: default-deny lookup plus filesystem and network
//!   scope checks
//! - [`Enforcer`]: a per-app view that turns denials into
//!   [`PermissionDenied`] errors
//! - An append-only [`AuditEntry`] log of every check
//!
//! # Security Model
//!
//! Absence of a grant is equivalent to an explicit denial. Every check,
//! granted or not, is audited.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mosaic_core::AppName;
//! use mosaic_permissions::{Category, FsMode, PermissionGrant, PermissionStore};
//!
//! let store = Arc::new(PermissionStore::new());
//! let notes = AppName::new("notes").unwrap();
//!
//! let grant = PermissionGrant::new()
//!     .allow(Category::Clipboard, "read")
//!     .scope(Category::Filesystem, "read", ["/home/user/notes"]);
//! store.register_app(notes.clone(), grant);
//!
//! assert!(store.has_permission(&notes, Category::Clipboard, "read"));
//! assert!(!store.has_permission(&notes, Category::Clipboard, "write"));
//! assert!(store.check_filesystem_access(&notes, "/home/user/notes/a.md", FsMode::Read));
//!
//! let enforcer = store.enforcer(notes);
//! assert!(enforcer.enforce(Category::Processes, "spawn").is_err());
//! assert_eq!(store.audit_log().len(), 4);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod audit;
mod enforcer;
mod error;
mod grant;
mod store;

pub use audit::AuditEntry;
pub use enforcer::Enforcer;
pub use error::{GrantError, PermissionDenied};
pub use grant::{
    ALLOWED_HOSTS, ActionGrant, Category, FsMode, PermissionGrant, PermissionsDef,
};
pub use store::PermissionStore;
