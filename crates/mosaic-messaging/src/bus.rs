//! The messaging bus.

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use mosaic_core::{Endpoint, ScheduledTask};
use mosaic_events::{EventBus, EventMetadata, ShellEvent};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{HandlerError, RequestError};
use crate::message::{Message, response_kind};

/// Default time a request waits for its response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5_000);

const EVENT_SOURCE: &str = "messaging";

/// Handles messages addressed to one endpoint.
pub type MessageHandler = Arc<dyn Fn(&Message) -> Result<(), HandlerError> + Send + Sync>;

/// Receives the outcome of a request exactly once.
pub type ResponseCallback = Box<dyn FnOnce(Result<serde_json::Value, RequestError>) + Send>;

/// What happened to a sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The recipient's handler accepted it.
    Delivered,
    /// The recipient has no handler; the message is waiting in its queue.
    Queued,
    /// The recipient's handler failed or panicked.
    Failed(String),
}

impl Delivery {
    /// Whether the message reached a handler successfully.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Routes messages between endpoints.
///
/// Clones share state. Handlers and response callbacks are always invoked
/// with the internal lock released, so they may call back into the bus.
/// Queues are unbounded.
#[derive(Clone)]
pub struct MessageBus {
    shared: Arc<Shared>,
}

struct Shared {
    events: EventBus,
    request_timeout: Duration,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    handlers: HashMap<Endpoint, MessageHandler>,
    queues: HashMap<Endpoint, VecDeque<Message>>,
    /// Endpoints whose queue is being drained. New messages for them join
    /// the back of the queue so delivery order matches send order.
    flushing: HashSet<Endpoint>,
    pending: HashMap<Uuid, PendingRequest>,
}

struct PendingRequest {
    requester: Endpoint,
    response_kind: String,
    callback: ResponseCallback,
    timer: Option<ScheduledTask>,
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("MessageBus")
            .field("handlers", &state.handlers.len())
            .field("queued", &state.queues.values().map(VecDeque::len).sum::<usize>())
            .field("pending", &state.pending.len())
            .field("request_timeout", &self.shared.request_timeout)
            .finish()
    }
}

impl MessageBus {
    /// Create a bus publishing signals on `events`.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self::with_request_timeout(events, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a bus with a custom default request timeout.
    #[must_use]
    pub fn with_request_timeout(events: EventBus, request_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                events,
                request_timeout,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Default request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.shared.request_timeout
    }

    /// Set the handler for an endpoint, replacing any previous one, then
    /// flush its queue in FIFO order.
    ///
    /// Every queued message is removed whether or not its delivery
    /// succeeds. Messages sent to the endpoint while the flush runs are
    /// delivered after the ones already queued. Returns the number of
    /// flushed messages.
    pub fn register_handler(&self, endpoint: Endpoint, handler: MessageHandler) -> usize {
        let queued = {
            let mut state = self.shared.lock();
            state.handlers.insert(endpoint.clone(), handler);
            let queued = state.queues.get(&endpoint).map_or(0, VecDeque::len);
            if queued == 0 || !state.flushing.insert(endpoint.clone()) {
                // Nothing to flush, or an outer flush will pick up the new
                // handler for the remaining messages.
                debug!(endpoint = %endpoint, queued, "Handler registered");
                return 0;
            }
            queued
        };

        debug!(endpoint = %endpoint, queued, "Handler registered, flushing queue");
        let mut flushed: usize = 0;
        while let Some((handler, message)) = self.shared.next_flushed(&endpoint) {
            self.shared.deliver(&handler, &message);
            flushed = flushed.saturating_add(1);
        }
        flushed
    }

    /// Remove an endpoint's handler.
    ///
    /// Returns `true` if one was registered.
    pub fn unregister_handler(&self, endpoint: &Endpoint) -> bool {
        let removed = self.shared.lock().handlers.remove(endpoint);
        let found = removed.is_some();
        drop(removed);
        if found {
            debug!(endpoint = %endpoint, "Handler unregistered");
        }
        found
    }

    /// Drop every message queued for an endpoint.
    ///
    /// Returns the number dropped.
    pub fn clear_queue(&self, endpoint: &Endpoint) -> usize {
        let dropped = self
            .shared
            .lock()
            .queues
            .remove(endpoint)
            .map_or(0, |q| q.len());
        if dropped > 0 {
            debug!(endpoint = %endpoint, dropped, "Queue cleared");
        }
        dropped
    }

    /// Send a message.
    ///
    /// Delivered synchronously when `to` has a handler, queued otherwise.
    pub fn send_message(
        &self,
        from: Endpoint,
        to: Endpoint,
        kind: impl Into<String>,
        data: serde_json::Value,
    ) -> Delivery {
        self.shared.dispatch(Message::new(from, to, kind, data, None))
    }

    /// Send a message to every endpoint with a handler except the sender
    /// and the system endpoint.
    ///
    /// Returns the number of successful deliveries.
    pub fn broadcast(&self, from: &Endpoint, kind: &str, data: &serde_json::Value) -> usize {
        let mut targets: Vec<Endpoint> = self
            .shared
            .lock()
            .handlers
            .keys()
            .filter(|endpoint| *endpoint != from && !endpoint.is_system())
            .cloned()
            .collect();
        targets.sort();

        debug!(from = %from, kind, targets = targets.len(), "Broadcasting");
        targets
            .into_iter()
            .map(|to| self.send_message(from.clone(), to, kind, data.clone()))
            .filter(Delivery::is_delivered)
            .count()
    }

    /// Send a request and resolve `on_response` with the reply.
    ///
    /// The message carries a fresh request id. A later message addressed to
    /// `from` with kind `"<kind>:response"` and the same request id resolves
    /// the request with its data and is not forwarded to `from`'s handler.
    /// If no reply arrives within `timeout` (default: the bus timeout) the
    /// callback receives [`RequestError::TimedOut`]. If the request fails
    /// synchronously it receives [`RequestError::DeliveryFailed`]. Without
    /// a tokio runtime the timeout cannot be armed, so the request is not
    /// sent and the callback receives [`RequestError::NoRuntime`] at once.
    /// The callback runs exactly once.
    ///
    /// Returns the request id.
    pub fn send_request(
        &self,
        from: Endpoint,
        to: Endpoint,
        kind: &str,
        data: serde_json::Value,
        on_response: ResponseCallback,
        timeout: Option<Duration>,
    ) -> Uuid {
        let request_id = Uuid::new_v4();
        let timeout = timeout.unwrap_or(self.shared.request_timeout);

        if !ScheduledTask::runtime_available() {
            warn!(request_id = %request_id, from = %from, to = %to, kind, "No runtime to time the request, rejecting");
            self.shared.complete(
                PendingRequest {
                    requester: from,
                    response_kind: response_kind(kind),
                    callback: on_response,
                    timer: None,
                },
                Err(RequestError::NoRuntime),
            );
            return request_id;
        }

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let timer = ScheduledTask::after("request-timeout", timeout, move || {
            if let Some(shared) = weak.upgrade() {
                shared.resolve(request_id, Err(RequestError::TimedOut));
            }
        });

        self.shared.lock().pending.insert(
            request_id,
            PendingRequest {
                requester: from.clone(),
                response_kind: response_kind(kind),
                callback: on_response,
                timer: Some(timer),
            },
        );
        trace!(request_id = %request_id, from = %from, to = %to, kind, ?timeout, "Request registered");

        let message = Message::new(from, to, kind, data, Some(request_id));
        if let Delivery::Failed(reason) = self.shared.dispatch(message) {
            self.shared
                .resolve(request_id, Err(RequestError::DeliveryFailed(reason)));
        }
        request_id
    }

    /// Reply to a request with kind `"<kind>:response"`.
    pub fn send_response(
        &self,
        from: Endpoint,
        to: Endpoint,
        kind: &str,
        request_id: Uuid,
        data: serde_json::Value,
    ) -> Delivery {
        self.shared
            .dispatch(Message::new(from, to, response_kind(kind), data, Some(request_id)))
    }

    /// Whether an endpoint has a handler.
    #[must_use]
    pub fn has_handler(&self, endpoint: &Endpoint) -> bool {
        self.shared.lock().handlers.contains_key(endpoint)
    }

    /// Number of messages waiting for an endpoint.
    #[must_use]
    pub fn queued_count(&self, endpoint: &Endpoint) -> usize {
        self.shared
            .lock()
            .queues
            .get(endpoint)
            .map_or(0, VecDeque::len)
    }

    /// Number of unresolved requests.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.shared.lock().pending.len()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, message: Message) -> Delivery {
        self.events.publish(ShellEvent::MessageSent {
            metadata: metadata_for(&message),
            message_id: message.id(),
            from: message.from().clone(),
            to: message.to().clone(),
            kind: message.kind().to_string(),
        });

        if let Some(pending) = self.take_matching_request(&message) {
            trace!(message_id = %message.id(), kind = message.kind(), "Response matched pending request");
            self.complete(pending, Ok(message.data().clone()));
            self.publish_delivered(&message);
            return Delivery::Delivered;
        }

        let queue_len = {
            let mut state = self.lock();
            let handler = state
                .handlers
                .get(message.to())
                .filter(|_| !state.flushing.contains(message.to()))
                .cloned();
            if let Some(handler) = handler {
                drop(state);
                return self.deliver(&handler, &message);
            }
            let queue = state.queues.entry(message.to().clone()).or_default();
            queue.push_back(message.clone());
            queue.len()
        };

        debug!(
            message_id = %message.id(),
            to = %message.to(),
            kind = message.kind(),
            queue_len,
            "Message queued"
        );
        self.events.publish(ShellEvent::MessageQueued {
            metadata: metadata_for(&message),
            message_id: message.id(),
            from: message.from().clone(),
            to: message.to().clone(),
            kind: message.kind().to_string(),
            queue_len,
        });
        Delivery::Queued
    }

    /// Pop the next message of a flushing endpoint with its current handler.
    ///
    /// Ends the flush when the queue is empty or the handler is gone; in the
    /// latter case the remaining messages stay queued.
    fn next_flushed(&self, endpoint: &Endpoint) -> Option<(MessageHandler, Message)> {
        let mut state = self.lock();
        let handler = state.handlers.get(endpoint).cloned();
        let message = match handler {
            Some(_) => state.queues.get_mut(endpoint).and_then(VecDeque::pop_front),
            None => None,
        };
        match (handler, message) {
            (Some(handler), Some(message)) => Some((handler, message)),
            _ => {
                state.flushing.remove(endpoint);
                if state.queues.get(endpoint).is_some_and(VecDeque::is_empty) {
                    state.queues.remove(endpoint);
                }
                None
            },
        }
    }

    fn deliver(&self, handler: &MessageHandler, message: &Message) -> Delivery {
        let outcome = catch_unwind(AssertUnwindSafe(|| handler(message)));
        let reason = match outcome {
            Ok(Ok(())) => {
                trace!(message_id = %message.id(), to = %message.to(), kind = message.kind(), "Message delivered");
                self.publish_delivered(message);
                return Delivery::Delivered;
            },
            Ok(Err(e)) => e.to_string(),
            Err(panic) => format!("handler panicked: {}", panic_message(panic.as_ref())),
        };

        warn!(
            message_id = %message.id(),
            from = %message.from(),
            to = %message.to(),
            kind = message.kind(),
            reason = %reason,
            "Message delivery failed"
        );
        self.events.publish(ShellEvent::MessageFailed {
            metadata: metadata_for(message),
            message_id: message.id(),
            from: message.from().clone(),
            to: message.to().clone(),
            kind: message.kind().to_string(),
            reason: reason.clone(),
        });
        Delivery::Failed(reason)
    }

    fn take_matching_request(&self, message: &Message) -> Option<PendingRequest> {
        if !message.is_response() {
            return None;
        }
        let request_id = message.request_id()?;
        let mut state = self.lock();
        let matches = state.pending.get(&request_id).is_some_and(|pending| {
            &pending.requester == message.to() && pending.response_kind == message.kind()
        });
        if matches {
            state.pending.remove(&request_id)
        } else {
            None
        }
    }

    /// Resolve a pending request. A no-op if it already resolved.
    fn resolve(&self, request_id: Uuid, result: Result<serde_json::Value, RequestError>) {
        let pending = self.lock().pending.remove(&request_id);
        match pending {
            Some(pending) => {
                if let Err(e) = &result {
                    debug!(request_id = %request_id, error = %e, "Request resolved without response");
                }
                self.complete(pending, result);
            },
            None => trace!(request_id = %request_id, "Request already resolved"),
        }
    }

    fn complete(&self, mut pending: PendingRequest, result: Result<serde_json::Value, RequestError>) {
        if let Some(timer) = pending.timer.take() {
            timer.cancel();
        }
        let callback = pending.callback;
        if catch_unwind(AssertUnwindSafe(move || callback(result))).is_err() {
            warn!(requester = %pending.requester, "Response callback panicked");
        }
    }

    fn publish_delivered(&self, message: &Message) {
        self.events.publish(ShellEvent::MessageDelivered {
            metadata: metadata_for(message),
            message_id: message.id(),
            from: message.from().clone(),
            to: message.to().clone(),
            kind: message.kind().to_string(),
        });
    }
}

fn metadata_for(message: &Message) -> EventMetadata {
    let metadata = EventMetadata::new(EVENT_SOURCE);
    match message.request_id() {
        Some(id) => metadata.with_correlation_id(id),
        None => metadata,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
