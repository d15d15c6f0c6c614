//! Mock implementations for testing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mosaic_apps::{AppManifestRecord, RenderError, Renderer};
use mosaic_core::ViewHandle;
use mosaic_events::{EventSubscriber, ShellEvent};

/// Mock view that records every call made on it.
#[derive(Debug, Default)]
pub struct MockView {
    name: String,
    z_order: AtomicI64,
    focus_count: AtomicUsize,
    destroy_count: AtomicUsize,
    memory: Mutex<Option<u64>>,
}

impl MockView {
    /// Create a mock view for an app.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Report `bytes` from [`ViewHandle::memory_sample`].
    #[must_use]
    pub fn with_memory(self, bytes: u64) -> Self {
        self.set_memory(Some(bytes));
        self
    }

    /// Change the reported memory footprint.
    pub fn set_memory(&self, bytes: Option<u64>) {
        if let Ok(mut guard) = self.memory.lock() {
            *guard = bytes;
        }
    }

    /// The app name this view was created for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How many times `force_focus` was called.
    #[must_use]
    pub fn focus_count(&self) -> usize {
        self.focus_count.load(Ordering::SeqCst)
    }

    /// How many times `destroy` was called.
    #[must_use]
    pub fn destroy_count(&self) -> usize {
        self.destroy_count.load(Ordering::SeqCst)
    }

    /// Whether `destroy` was called at least once.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroy_count() > 0
    }
}

impl ViewHandle for MockView {
    fn z_order(&self) -> i64 {
        self.z_order.load(Ordering::SeqCst)
    }

    fn set_z_order(&self, z: i64) {
        self.z_order.store(z, Ordering::SeqCst);
    }

    fn force_focus(&self) {
        self.focus_count.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.destroy_count.fetch_add(1, Ordering::SeqCst);
    }

    fn memory_sample(&self) -> Option<u64> {
        self.memory.lock().ok().and_then(|guard| *guard)
    }
}

/// Mock renderer that hands out [`MockView`]s.
///
/// Keeps a reference to every view it created so tests can inspect them.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    views: Arc<Mutex<Vec<Arc<MockView>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    memory: Arc<Mutex<Option<u64>>>,
}

impl MockRenderer {
    /// Create a renderer that succeeds for every app.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail view creation for the named app.
    #[must_use]
    pub fn failing_for(self, name: &str) -> Self {
        if let Ok(mut guard) = self.failing.lock() {
            guard.insert(name.to_string());
        }
        self
    }

    /// Give every new view this memory footprint.
    #[must_use]
    pub fn with_memory(self, bytes: u64) -> Self {
        if let Ok(mut guard) = self.memory.lock() {
            *guard = Some(bytes);
        }
        self
    }

    /// The most recent view created for the named app.
    #[must_use]
    pub fn view(&self, name: &str) -> Option<Arc<MockView>> {
        self.views
            .lock()
            .ok()?
            .iter()
            .rev()
            .find(|v| v.name() == name)
            .cloned()
    }

    /// Number of views created so far.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.views.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl Renderer for MockRenderer {
    fn create_view(&self, manifest: &AppManifestRecord) -> Result<Arc<dyn ViewHandle>, RenderError> {
        let name = manifest.name().as_str();
        let should_fail = self
            .failing
            .lock()
            .map(|guard| guard.contains(name))
            .unwrap_or(false);
        if should_fail {
            return Err(RenderError::new(format!(
                "failed to load {}",
                manifest.entrypoint()
            )));
        }

        let view = MockView::new(name);
        if let Ok(guard) = self.memory.lock() {
            view.set_memory(*guard);
        }
        let view = Arc::new(view);
        if let Ok(mut guard) = self.views.lock() {
            guard.push(Arc::clone(&view));
        }
        Ok(view)
    }
}

/// Subscriber that records every event it sees.
#[derive(Debug, Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<ShellEvent>>,
}

impl RecordingSubscriber {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<ShellEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Event type names, oldest first.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|g| g.iter().map(ShellEvent::event_type).collect())
            .unwrap_or_default()
    }

    /// Number of recorded events of one type.
    #[must_use]
    pub fn count_of(&self, event_type: &str) -> usize {
        self.event_types()
            .into_iter()
            .filter(|t| *t == event_type)
            .count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn on_event(&self, event: &ShellEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "recording"
    }
}
