use thiserror::Error;

/// Error returned by a message handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    /// Create a handler error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Why a request resolved without a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No response arrived before the deadline.
    #[error("timed out")]
    TimedOut,

    /// The request itself could not be delivered.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// No tokio runtime was available to arm the timeout.
    #[error("no runtime available to time the request")]
    NoRuntime,
}
