//! Resource tracker.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use mosaic_core::{AppName, ScheduledTask};
use mosaic_events::{EventBus, EventMetadata, ShellEvent};
use tracing::{debug, info, trace, warn};

use crate::limits::ResourceLimits;
use crate::usage::{ResourceReport, ResourceUsageRecord, TotalUsage};

/// Resource name used in memory quota signals.
pub const MEMORY_RESOURCE: &str = "memory";

const EVENT_SOURCE: &str = "resources";

/// Reads an app's current memory footprint in bytes.
///
/// Returns `None` when no measurement is available, in which case the
/// previous estimate is kept.
pub type MemorySampler = Box<dyn Fn() -> Option<u64> + Send + Sync>;

/// Tracks per-app resource usage and publishes quota signals.
///
/// State lives behind a single mutex shared with the sampling tasks.
/// Signals are published after the lock is released, so subscribers may
/// call back into the tracker.
pub struct ResourceTracker {
    shared: Arc<Shared>,
}

struct Shared {
    limits: ResourceLimits,
    events: EventBus,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    records: HashMap<AppName, ResourceUsageRecord>,
    samplers: HashMap<AppName, ScheduledTask>,
    totals: TotalUsage,
    aggregate_exceeded: bool,
}

impl std::fmt::Debug for ResourceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTracker")
            .field("limits", &self.shared.limits)
            .field("tracked", &self.tracked_count())
            .finish_non_exhaustive()
    }
}

impl ResourceTracker {
    /// Create a tracker publishing signals on `events`.
    #[must_use]
    pub fn new(limits: ResourceLimits, events: EventBus) -> Self {
        Self {
            shared: Arc::new(Shared {
                limits,
                events,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// The limits in force.
    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.shared.limits
    }

    /// Start tracking an app.
    ///
    /// The record starts at the base memory estimate and `sampler` is polled
    /// every sample interval on the tokio runtime. Tracking an app again
    /// replaces its record and its sampling task.
    pub fn track(&self, app: AppName, sampler: MemorySampler) {
        let task = self.spawn_sampler(app.clone(), sampler);

        let (replaced, signals) = {
            let mut state = self.shared.lock();
            state
                .records
                .insert(app.clone(), ResourceUsageRecord::new(self.shared.limits.base_memory_estimate));
            let replaced = state.samplers.insert(app.clone(), task);
            let signals = self.shared.refresh_totals(&mut state);
            (replaced, signals)
        };
        drop(replaced);

        info!(
            app = %app,
            base_estimate = self.shared.limits.base_memory_estimate,
            interval_secs = self.shared.limits.sample_interval.as_secs(),
            "Tracking resources"
        );
        self.shared.publish(signals);
    }

    /// Stop tracking an app and cancel its sampling task.
    ///
    /// Returns `true` if the app was tracked.
    pub fn untrack(&self, app: &AppName) -> bool {
        let (removed, task, signals) = {
            let mut state = self.shared.lock();
            let removed = state.records.remove(app).is_some();
            let task = state.samplers.remove(app);
            let signals = self.shared.refresh_totals(&mut state);
            (removed, task, signals)
        };
        drop(task);

        if removed {
            info!(app = %app, "Stopped tracking resources");
        }
        self.shared.publish(signals);
        removed
    }

    /// Record a memory sample for an app.
    ///
    /// Returns `false` if the app is not tracked.
    pub fn record_sample(&self, app: &AppName, bytes: u64) -> bool {
        self.shared.record_sample(app, bytes)
    }

    /// Count one network request for an app.
    ///
    /// Returns `false` if the app is not tracked.
    pub fn record_network_request(&self, app: &AppName) -> bool {
        self.shared.update(app, |record| {
            record.network_requests = record.network_requests.saturating_add(1);
        })
    }

    /// Set the storage attributed to an app.
    ///
    /// Returns `false` if the app is not tracked.
    pub fn record_storage(&self, app: &AppName, bytes: u64) -> bool {
        self.shared.update(app, |record| record.storage_bytes = bytes)
    }

    /// Current usage for one app.
    #[must_use]
    pub fn usage(&self, app: &AppName) -> Option<ResourceUsageRecord> {
        self.shared.lock().records.get(app).cloned()
    }

    /// Totals across all tracked apps.
    #[must_use]
    pub fn total_usage(&self) -> TotalUsage {
        self.shared.lock().totals
    }

    /// Whether an app is tracked.
    #[must_use]
    pub fn is_tracked(&self, app: &AppName) -> bool {
        self.shared.lock().records.contains_key(app)
    }

    /// Number of tracked apps.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.shared.lock().records.len()
    }

    /// Snapshot of all usage.
    #[must_use]
    pub fn report(&self) -> ResourceReport {
        let state = self.shared.lock();
        ResourceReport {
            apps: state
                .records
                .iter()
                .map(|(name, record)| (name.clone(), record.clone()))
                .collect(),
            totals: state.totals,
            limits: self.shared.limits,
            aggregate_exceeded: state.aggregate_exceeded,
            generated_at: Utc::now(),
        }
    }

    fn spawn_sampler(&self, app: AppName, sampler: MemorySampler) -> ScheduledTask {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        ScheduledTask::every("resource-sampler", self.shared.limits.sample_interval, move || {
            let Some(shared) = shared.upgrade() else {
                return ControlFlow::Break(());
            };
            match sampler() {
                Some(bytes) => {
                    if shared.record_sample(&app, bytes) {
                        ControlFlow::Continue(())
                    } else {
                        ControlFlow::Break(())
                    }
                },
                None => {
                    trace!(app = %app, "No memory sample available");
                    ControlFlow::Continue(())
                },
            }
        })
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_sample(&self, app: &AppName, bytes: u64) -> bool {
        let signals = {
            let mut state = self.lock();
            let Some(record) = state.records.get_mut(app) else {
                debug!(app = %app, "Sample for untracked app ignored");
                return false;
            };
            record.memory_estimate_bytes = bytes;
            record.last_sampled = Some(Utc::now());
            trace!(app = %app, bytes, "Memory sampled");

            let mut signals = self.check_app_limits(app, record);
            signals.extend(self.refresh_totals(&mut state));
            signals
        };
        self.publish(signals);
        true
    }

    fn update(&self, app: &AppName, apply: impl FnOnce(&mut ResourceUsageRecord)) -> bool {
        let mut state = self.lock();
        let Some(record) = state.records.get_mut(app) else {
            return false;
        };
        apply(record);
        let totals = TotalUsage::sum(state.records.values());
        state.totals = totals;
        true
    }

    /// Edge-triggered per-app checks. Flags re-arm once usage drops back.
    fn check_app_limits(&self, app: &AppName, record: &mut ResourceUsageRecord) -> Vec<ShellEvent> {
        let bytes = record.memory_estimate_bytes;
        let limit = self.limits.per_app_memory_limit;
        let mut signals = Vec::new();

        if bytes > self.limits.warning_threshold() {
            if !record.warned {
                record.warned = true;
                warn!(app = %app, bytes, limit, "App entered memory warning band");
                signals.push(ShellEvent::ResourceWarning {
                    metadata: EventMetadata::new(EVENT_SOURCE),
                    app: app.clone(),
                    resource: MEMORY_RESOURCE.to_string(),
                    value: bytes,
                    limit,
                });
            }
        } else {
            record.warned = false;
        }

        if bytes > limit {
            if !record.exceeded {
                record.exceeded = true;
                warn!(app = %app, bytes, limit, "App exceeded memory limit");
                signals.push(ShellEvent::ResourceLimitExceeded {
                    metadata: EventMetadata::new(EVENT_SOURCE),
                    app: app.clone(),
                    resource: MEMORY_RESOURCE.to_string(),
                });
            }
        } else {
            record.exceeded = false;
        }

        signals
    }

    fn refresh_totals(&self, state: &mut State) -> Vec<ShellEvent> {
        state.totals = TotalUsage::sum(state.records.values());
        let total = state.totals.memory_bytes;
        let limit = self.limits.aggregate_memory_limit;

        if total <= limit {
            state.aggregate_exceeded = false;
            return Vec::new();
        }
        if state.aggregate_exceeded {
            return Vec::new();
        }
        state.aggregate_exceeded = true;
        warn!(total, limit, "Aggregate memory limit exceeded");
        vec![ShellEvent::AggregateLimitExceeded {
            metadata: EventMetadata::new(EVENT_SOURCE),
            resource: MEMORY_RESOURCE.to_string(),
            total,
            limit,
        }]
    }

    fn publish(&self, signals: Vec<ShellEvent>) {
        for signal in signals {
            self.events.publish(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    fn app(name: &str) -> AppName {
        AppName::new(name).unwrap()
    }

    fn limits() -> ResourceLimits {
        ResourceLimits {
            per_app_memory_limit: 1_000,
            aggregate_memory_limit: 1_500,
            warning_ratio: 0.8,
            base_memory_estimate: 100,
            sample_interval: Duration::from_secs(30),
        }
    }

    fn no_sample() -> MemorySampler {
        Box::new(|| None)
    }

    fn event_types(receiver: &mut mosaic_events::EventReceiver) -> Vec<&'static str> {
        receiver.drain().iter().map(|e| e.event_type()).collect()
    }

    #[tokio::test]
    async fn test_track_starts_at_base_estimate() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        tracker.track(app("notes"), no_sample());

        let usage = tracker.usage(&app("notes")).unwrap();
        assert_eq!(usage.memory_estimate_bytes, 100);
        assert!(usage.last_sampled.is_none());
        assert_eq!(tracker.total_usage().memory_bytes, 100);
    }

    #[tokio::test]
    async fn test_warning_fires_once_per_crossing() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let tracker = ResourceTracker::new(limits(), bus);
        let notes = app("notes");
        tracker.track(notes.clone(), no_sample());

        tracker.record_sample(&notes, 850);
        tracker.record_sample(&notes, 900);
        assert_eq!(event_types(&mut receiver), vec!["resource_warning"]);

        // Dropping below re-arms the warning.
        tracker.record_sample(&notes, 200);
        tracker.record_sample(&notes, 820);
        assert_eq!(event_types(&mut receiver), vec!["resource_warning"]);
    }

    #[tokio::test]
    async fn test_limit_exceeded_signal() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let tracker = ResourceTracker::new(limits(), bus);
        let notes = app("notes");
        tracker.track(notes.clone(), no_sample());

        tracker.record_sample(&notes, 1_200);
        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        match events[0].as_ref() {
            ShellEvent::ResourceWarning { app, resource, value, limit, .. } => {
                assert_eq!(app, &notes);
                assert_eq!(resource, MEMORY_RESOURCE);
                assert_eq!(*value, 1_200);
                assert_eq!(*limit, 1_000);
            },
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(events[1].event_type(), "resource_limit_exceeded");

        let usage = tracker.usage(&notes).unwrap();
        assert!(usage.warned && usage.exceeded);
        assert!(usage.last_sampled.is_some());

        // Advisory only: the app stays tracked.
        assert!(tracker.is_tracked(&notes));
    }

    #[tokio::test]
    async fn test_aggregate_limit_is_edge_triggered() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let tracker = ResourceTracker::new(limits(), bus);
        let (a, b) = (app("a"), app("b"));
        tracker.track(a.clone(), no_sample());
        tracker.track(b.clone(), no_sample());

        tracker.record_sample(&a, 800);
        tracker.record_sample(&b, 800);
        tracker.record_sample(&b, 900);
        let aggregate: Vec<_> = receiver
            .drain()
            .into_iter()
            .filter(|e| e.event_type() == "aggregate_limit_exceeded")
            .collect();
        assert_eq!(aggregate.len(), 1);
        assert!(tracker.report().aggregate_exceeded);

        tracker.untrack(&b);
        assert!(!tracker.report().aggregate_exceeded);
        assert_eq!(tracker.total_usage().memory_bytes, 800);
    }

    #[tokio::test]
    async fn test_untrack() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        let notes = app("notes");
        tracker.track(notes.clone(), no_sample());

        assert!(tracker.untrack(&notes));
        assert!(!tracker.untrack(&notes));
        assert!(!tracker.record_sample(&notes, 10));
        assert_eq!(tracker.total_usage(), TotalUsage::default());
    }

    #[tokio::test]
    async fn test_network_and_storage_counters() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        let notes = app("notes");
        tracker.track(notes.clone(), no_sample());

        tracker.record_network_request(&notes);
        tracker.record_network_request(&notes);
        tracker.record_storage(&notes, 4_096);

        let totals = tracker.total_usage();
        assert_eq!(totals.network_requests, 2);
        assert_eq!(totals.storage_bytes, 4_096);
        assert!(!tracker.record_network_request(&app("ghost")));
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        tracker.track(app("notes"), no_sample());

        let json = serde_json::to_value(tracker.report()).unwrap();
        assert_eq!(json["apps"]["notes"]["memory_estimate_bytes"], 100);
        assert_eq!(json["limits"]["sample_interval"], 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sampling() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        let notes = app("notes");
        let reading = Arc::new(AtomicU64::new(300));
        let reading_clone = Arc::clone(&reading);
        tracker.track(
            notes.clone(),
            Box::new(move || Some(reading_clone.load(Ordering::SeqCst))),
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(tracker.usage(&notes).unwrap().memory_estimate_bytes, 300);

        reading.store(400, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(tracker.usage(&notes).unwrap().memory_estimate_bytes, 400);
    }

    #[tokio::test(start_paused = true)]
    async fn test_untrack_cancels_sampling() {
        let tracker = ResourceTracker::new(limits(), EventBus::new());
        let notes = app("notes");
        let calls = Arc::new(AtomicU64::new(0));
        let calls_clone = Arc::clone(&calls);
        tracker.track(
            notes.clone(),
            Box::new(move || {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                Some(500)
            }),
        );

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tracker.untrack(&notes);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
