//! Signal types emitted by the Mosaic runtime.

use chrono::{DateTime, Utc};
use mosaic_core::{AppName, Endpoint};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Correlation ID for tracing related events.
    pub correlation_id: Option<Uuid>,
    /// Source component that generated the event.
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            correlation_id: None,
            source: source.into(),
        }
    }

    /// Set correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// All signals the runtime emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    // ========== App Lifecycle ==========
    /// An app instance was created and is running.
    AppLaunched {
        /// Event metadata.
        metadata: EventMetadata,
        /// The launched app.
        app: AppName,
        /// Initial render order.
        z_order: i64,
    },

    /// An app instance was closed and its view destroyed.
    AppClosed {
        /// Event metadata.
        metadata: EventMetadata,
        /// The closed app.
        app: AppName,
    },

    /// An app gained input focus.
    AppFocused {
        /// Event metadata.
        metadata: EventMetadata,
        /// The newly focused app.
        app: AppName,
        /// The app that held focus before, if any.
        previous: Option<AppName>,
    },

    /// An app lost focus and was paused.
    AppPaused {
        /// Event metadata.
        metadata: EventMetadata,
        /// The paused app.
        app: AppName,
    },

    /// An app failed to launch.
    AppFailed {
        /// Event metadata.
        metadata: EventMetadata,
        /// The app that failed.
        app: AppName,
        /// Failure description.
        reason: String,
    },

    // ========== Messaging ==========
    /// A message was submitted to the bus.
    MessageSent {
        /// Event metadata.
        metadata: EventMetadata,
        /// Message identifier.
        message_id: Uuid,
        /// Sender.
        from: Endpoint,
        /// Recipient.
        to: Endpoint,
        /// Message type.
        kind: String,
    },

    /// A message was handled successfully by its recipient.
    MessageDelivered {
        /// Event metadata.
        metadata: EventMetadata,
        /// Message identifier.
        message_id: Uuid,
        /// Sender.
        from: Endpoint,
        /// Recipient.
        to: Endpoint,
        /// Message type.
        kind: String,
    },

    /// A message was queued because the recipient has no handler yet.
    MessageQueued {
        /// Event metadata.
        metadata: EventMetadata,
        /// Message identifier.
        message_id: Uuid,
        /// Sender.
        from: Endpoint,
        /// Recipient.
        to: Endpoint,
        /// Message type.
        kind: String,
        /// Queue length for the recipient after enqueueing.
        queue_len: usize,
    },

    /// A recipient's handler failed on a message.
    MessageFailed {
        /// Event metadata.
        metadata: EventMetadata,
        /// Message identifier.
        message_id: Uuid,
        /// Sender.
        from: Endpoint,
        /// Recipient.
        to: Endpoint,
        /// Message type.
        kind: String,
        /// Failure description.
        reason: String,
    },

    // ========== Resources ==========
    /// An app entered the warning band of a quota.
    ResourceWarning {
        /// Event metadata.
        metadata: EventMetadata,
        /// The app.
        app: AppName,
        /// Resource name (e.g. `memory`).
        resource: String,
        /// Observed value.
        value: u64,
        /// The hard limit the warning is relative to.
        limit: u64,
    },

    /// An app crossed above its per-app quota.
    ResourceLimitExceeded {
        /// Event metadata.
        metadata: EventMetadata,
        /// The app.
        app: AppName,
        /// Resource name (e.g. `memory`).
        resource: String,
    },

    /// The sum over all apps crossed above the aggregate quota.
    AggregateLimitExceeded {
        /// Event metadata.
        metadata: EventMetadata,
        /// Resource name (e.g. `memory`).
        resource: String,
        /// Observed total.
        total: u64,
        /// The aggregate limit.
        limit: u64,
    },
}

impl ShellEvent {
    /// Get the event type as a string.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AppLaunched { .. } => "app_launched",
            Self::AppClosed { .. } => "app_closed",
            Self::AppFocused { .. } => "app_focused",
            Self::AppPaused { .. } => "app_paused",
            Self::AppFailed { .. } => "app_failed",
            Self::MessageSent { .. } => "message_sent",
            Self::MessageDelivered { .. } => "message_delivered",
            Self::MessageQueued { .. } => "message_queued",
            Self::MessageFailed { .. } => "message_failed",
            Self::ResourceWarning { .. } => "resource_warning",
            Self::ResourceLimitExceeded { .. } => "resource_limit_exceeded",
            Self::AggregateLimitExceeded { .. } => "aggregate_limit_exceeded",
        }
    }

    /// Get the event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::AppLaunched { metadata, .. }
            | Self::AppClosed { metadata, .. }
            | Self::AppFocused { metadata, .. }
            | Self::AppPaused { metadata, .. }
            | Self::AppFailed { metadata, .. }
            | Self::MessageSent { metadata, .. }
            | Self::MessageDelivered { metadata, .. }
            | Self::MessageQueued { metadata, .. }
            | Self::MessageFailed { metadata, .. }
            | Self::ResourceWarning { metadata, .. }
            | Self::ResourceLimitExceeded { metadata, .. }
            | Self::AggregateLimitExceeded { metadata, .. } => metadata,
        }
    }

    /// The app this event is primarily about, if any.
    ///
    /// For messaging events this is the recipient when it is an app.
    #[must_use]
    pub fn app(&self) -> Option<&AppName> {
        match self {
            Self::AppLaunched { app, .. }
            | Self::AppClosed { app, .. }
            | Self::AppFocused { app, .. }
            | Self::AppPaused { app, .. }
            | Self::AppFailed { app, .. }
            | Self::ResourceWarning { app, .. }
            | Self::ResourceLimitExceeded { app, .. } => Some(app),
            Self::MessageSent { to, .. }
            | Self::MessageDelivered { to, .. }
            | Self::MessageQueued { to, .. }
            | Self::MessageFailed { to, .. } => to.app(),
            Self::AggregateLimitExceeded { .. } => None,
        }
    }

    /// Whether this is a lifecycle event.
    #[must_use]
    pub fn is_lifecycle_event(&self) -> bool {
        matches!(
            self,
            Self::AppLaunched { .. }
                | Self::AppClosed { .. }
                | Self::AppFocused { .. }
                | Self::AppPaused { .. }
                | Self::AppFailed { .. }
        )
    }

    /// Whether this is a resource quota event.
    #[must_use]
    pub fn is_resource_event(&self) -> bool {
        matches!(
            self,
            Self::ResourceWarning { .. }
                | Self::ResourceLimitExceeded { .. }
                | Self::AggregateLimitExceeded { .. }
        )
    }
}
