//! Event subscriber trait and registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::ShellEvent;

/// Filter function type for event subscribers.
pub type EventFilter = Box<dyn Fn(&ShellEvent) -> bool + Send + Sync>;

/// Trait for synchronous event subscribers.
///
/// Subscribers are invoked on the publishing thread, so `on_event` should
/// return quickly. For heavy processing use an [`EventReceiver`] instead.
///
/// [`EventReceiver`]: crate::EventReceiver
pub trait EventSubscriber: Send + Sync {
    /// Called when an event is published.
    fn on_event(&self, event: &ShellEvent);

    /// Optional filter for event types.
    ///
    /// Return `true` to receive the event, `false` to skip it.
    /// Default implementation accepts all events.
    fn accepts(&self, event: &ShellEvent) -> bool {
        let _ = event;
        true
    }

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Registration handle for a subscriber. Pass it to
/// [`SubscriberRegistry::unregister`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Registry for managing synchronous event subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn EventSubscriber>>>,
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscriber_count", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber.
    ///
    /// Returns a handle that can be used to unregister the subscriber.
    pub fn register(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        let name = subscriber.name().to_string();

        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, subscriber);

        debug!(subscriber_name = %name, "Subscriber registered");
        id
    }

    /// Unregister a subscriber.
    ///
    /// Returns `true` if the subscriber was found and removed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        // Drop the removed subscriber after releasing the lock, in case its
        // destructor publishes.
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        let found = removed.is_some();
        drop(removed);

        if found {
            debug!("Subscriber unregistered");
        }
        found
    }

    /// Notify all subscribers of an event.
    ///
    /// The subscriber list is snapshotted first so subscribers may register
    /// or unregister from inside `on_event`. A panicking subscriber is logged
    /// and skipped.
    pub fn notify(&self, event: &ShellEvent) {
        let snapshot: Vec<(SubscriberId, Arc<dyn EventSubscriber>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, sub)| (*id, Arc::clone(sub)))
            .collect();

        for (id, subscriber) in snapshot {
            if !subscriber.accepts(event) {
                continue;
            }
            trace!(
                subscriber_name = %subscriber.name(),
                event_type = %event.event_type(),
                "Notifying subscriber"
            );

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event);
            }));

            if let Err(e) = result {
                warn!(
                    subscriber_id = ?id,
                    subscriber_name = %subscriber.name(),
                    error = ?e,
                    "Subscriber panicked"
                );
            }
        }
    }

    /// Get the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all subscribers.
    pub fn clear(&self) {
        let drained: Vec<_> = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        drop(drained);
        debug!("All subscribers cleared");
    }
}

/// A simple closure-based subscriber with an optional filter.
pub struct FilterSubscriber<F>
where
    F: Fn(&ShellEvent) + Send + Sync,
{
    name: String,
    filter: Option<EventFilter>,
    handler: F,
}

impl<F> FilterSubscriber<F>
where
    F: Fn(&ShellEvent) + Send + Sync,
{
    /// Create a new filter subscriber.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            filter: None,
            handler,
        }
    }

    /// Add a filter to this subscriber.
    #[must_use]
    pub fn with_filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ShellEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }
}

impl<F> EventSubscriber for FilterSubscriber<F>
where
    F: Fn(&ShellEvent) + Send + Sync,
{
    fn on_event(&self, event: &ShellEvent) {
        (self.handler)(event);
    }

    fn accepts(&self, event: &ShellEvent) -> bool {
        match &self.filter {
            Some(f) => f(event),
            None => true,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventMetadata;
    use mosaic_core::AppName;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSubscriber {
        name: String,
        count: AtomicUsize,
    }

    impl CountingSubscriber {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                count: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl EventSubscriber for CountingSubscriber {
        fn on_event(&self, _event: &ShellEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    fn closed_event() -> ShellEvent {
        ShellEvent::AppClosed {
            metadata: EventMetadata::new("test"),
            app: AppName::new("notes").unwrap(),
        }
    }

    fn warning_event() -> ShellEvent {
        ShellEvent::ResourceWarning {
            metadata: EventMetadata::new("test"),
            app: AppName::new("notes").unwrap(),
            resource: "memory".into(),
            value: 450,
            limit: 500,
        }
    }

    #[test]
    fn test_registry_register_unregister() {
        let registry = SubscriberRegistry::new();
        assert!(registry.is_empty());

        let id = registry.register(Arc::new(CountingSubscriber::new("test")));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id));
        assert!(registry.is_empty());
        assert!(!registry.unregister(id));
    }

    #[test]
    fn test_registry_notify() {
        let registry = SubscriberRegistry::new();
        let subscriber = Arc::new(CountingSubscriber::new("test"));
        registry.register(Arc::clone(&subscriber) as Arc<dyn EventSubscriber>);

        registry.notify(&closed_event());
        registry.notify(&closed_event());
        assert_eq!(subscriber.count(), 2);
    }

    #[test]
    fn test_filter_subscriber() {
        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);

        let subscriber = FilterSubscriber::new("resources_only", move |_event| {
            received_clone.fetch_add(1, Ordering::SeqCst);
        })
        .with_filter(ShellEvent::is_resource_event);

        let registry = SubscriberRegistry::new();
        registry.register(Arc::new(subscriber));

        registry.notify(&closed_event());
        assert_eq!(received.load(Ordering::SeqCst), 0);

        registry.notify(&warning_event());
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let registry = SubscriberRegistry::new();
        registry.register(Arc::new(FilterSubscriber::new("boom", |_event| {
            panic!("subscriber failure");
        })));
        let counter = Arc::new(CountingSubscriber::new("counter"));
        registry.register(Arc::clone(&counter) as Arc<dyn EventSubscriber>);

        registry.notify(&closed_event());
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_registry_clear() {
        let registry = SubscriberRegistry::new();
        registry.register(Arc::new(CountingSubscriber::new("sub1")));
        registry.register(Arc::new(CountingSubscriber::new("sub2")));
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }
}
