//! The message envelope.

use chrono::{DateTime, Utc};
use mosaic_core::Endpoint;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix appended to a request's kind to form its response kind.
pub const RESPONSE_SUFFIX: &str = ":response";

/// The response kind for a request kind: `"<kind>:response"`.
#[must_use]
pub fn response_kind(kind: &str) -> String {
    format!("{kind}{RESPONSE_SUFFIX}")
}

/// An immutable message between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    from: Endpoint,
    to: Endpoint,
    kind: String,
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<Uuid>,
}

impl Message {
    pub(crate) fn new(
        from: Endpoint,
        to: Endpoint,
        kind: impl Into<String>,
        data: serde_json::Value,
        request_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            kind: kind.into(),
            data,
            timestamp: Utc::now(),
            request_id,
        }
    }

    /// Unique message id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Sender.
    #[must_use]
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    /// Recipient.
    #[must_use]
    pub fn to(&self) -> &Endpoint {
        &self.to
    }

    /// Message type, e.g. `"paused"` or `"calendar.events:response"`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Payload.
    #[must_use]
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }

    /// When the message was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Correlation id for requests and their responses.
    #[must_use]
    pub fn request_id(&self) -> Option<Uuid> {
        self.request_id
    }

    /// Whether this message answers a request.
    #[must_use]
    pub fn is_response(&self) -> bool {
        self.request_id.is_some() && self.kind.ends_with(RESPONSE_SUFFIX)
    }
}
