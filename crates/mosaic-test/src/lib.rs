//! Mosaic Test - Shared test utilities for the Mosaic runtime.
//!
//! This crate provides mock collaborators and fixtures used across the
//! Mosaic crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! mosaic-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use mosaic_test::{MockRenderer, RecordingSubscriber, test_manifest};
//!
//! let renderer = MockRenderer::new();
//! let record = test_manifest("notes").validate().unwrap();
//! let view = renderer.create_view(&record).unwrap();
//! assert_eq!(renderer.created_count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
