//! Prelude module - commonly used test helpers.

pub use crate::{MockRenderer, MockView, RecordingSubscriber};

pub use crate::{init_test_tracing, test_app_name, test_manifest, test_manifest_with};
