//! Integration tests for the services the orchestrator wires together:
//! resource sampling, inter-app messaging, configuration and discovery.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mosaic_apps::MANIFEST_FILE_NAME;
use mosaic_config::Config;
use mosaic_core::Endpoint;
use mosaic_messaging::{HandlerError, Message, MessageBus, MessageHandler, RequestError};
use mosaic_runtime::{AppState, Orchestrator};
use mosaic_test::{
    MockRenderer, RecordingSubscriber, init_test_tracing, test_app_name, test_manifest,
    test_manifest_json,
};
use serde_json::{Value, json};

const MB: u64 = 1024 * 1024;

fn setup(config: &Config, renderer: &MockRenderer, apps: &[&str]) -> (Orchestrator, Arc<RecordingSubscriber>) {
    init_test_tracing();
    let mut orchestrator = Orchestrator::from_config(config, Arc::new(renderer.clone()));
    for app in apps {
        orchestrator.register_manifest(test_manifest(app)).unwrap();
    }
    let recorder = Arc::new(RecordingSubscriber::new());
    orchestrator.events().registry().register(Arc::clone(&recorder) as _);
    (orchestrator, recorder)
}

fn app_endpoint(name: &str) -> Endpoint {
    Endpoint::App(test_app_name(name))
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_over_limit_app_signals_once_per_crossing() {
    let renderer = MockRenderer::new().with_memory(600 * MB);
    let (mut orch, recorder) = setup(&Config::default(), &renderer, &["notes"]);
    let notes = test_app_name("notes");

    orch.launch_app(&notes).unwrap();
    assert_eq!(
        orch.resources().usage(&notes).unwrap().memory_estimate_bytes,
        50 * MB
    );
    assert_eq!(recorder.count_of("resource_limit_exceeded"), 0);

    // First sample lands one interval after launch.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(recorder.count_of("resource_warning"), 1);
    assert_eq!(recorder.count_of("resource_limit_exceeded"), 1);
    assert_eq!(
        orch.resources().usage(&notes).unwrap().memory_estimate_bytes,
        600 * MB
    );

    // Staying over the limit does not repeat the signal.
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(recorder.count_of("resource_limit_exceeded"), 1);

    // Dropping back re-arms it.
    let view = renderer.view("notes").unwrap();
    view.set_memory(Some(100 * MB));
    tokio::time::sleep(Duration::from_secs(30)).await;
    view.set_memory(Some(600 * MB));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.count_of("resource_limit_exceeded"), 2);

    // Quotas are advisory.
    assert_eq!(orch.app_state(&notes), AppState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_aggregate_limit_from_config() {
    let mut config = Config::default();
    config.resources.aggregate_memory_limit = 1024 * MB;
    config.resources.sample_interval_secs = 5;
    let renderer = MockRenderer::new().with_memory(600 * MB);
    let (mut orch, recorder) = setup(&config, &renderer, &["calendar", "notes"]);

    orch.launch_app(&test_app_name("calendar")).unwrap();
    orch.launch_app(&test_app_name("notes")).unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(recorder.count_of("aggregate_limit_exceeded"), 1);
    let report = orch.resource_report();
    assert!(report.aggregate_exceeded);
    assert_eq!(report.totals.memory_bytes, 1200 * MB);
    assert_eq!(report.apps.len(), 2);

    // Closing one app brings the total back under the limit.
    orch.close_app(&test_app_name("notes")).unwrap();
    assert!(!orch.resource_report().aggregate_exceeded);
}

#[tokio::test(start_paused = true)]
async fn test_closed_app_is_no_longer_sampled() {
    let renderer = MockRenderer::new().with_memory(600 * MB);
    let (mut orch, recorder) = setup(&Config::default(), &renderer, &["notes"]);
    let notes = test_app_name("notes");

    orch.launch_app(&notes).unwrap();
    orch.close_app(&notes).unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(orch.resources().usage(&notes).is_none());
    assert_eq!(recorder.count_of("resource_limit_exceeded"), 0);
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// A calendar that answers `events:list` requests with a fixed payload.
fn calendar_responder(bus: MessageBus) -> MessageHandler {
    Arc::new(move |message: &Message| -> Result<(), HandlerError> {
        if message.kind() == "events:list" {
            if let Some(request_id) = message.request_id() {
                bus.send_response(
                    message.to().clone(),
                    message.from().clone(),
                    message.kind(),
                    request_id,
                    json!({ "events": ["standup", "review"] }),
                );
            }
        }
        Ok(())
    })
}

type Outcome = Arc<Mutex<Option<Result<Value, RequestError>>>>;

fn outcome_callback(outcome: &Outcome) -> mosaic_messaging::ResponseCallback {
    let slot = Arc::clone(outcome);
    Box::new(move |result: Result<Value, RequestError>| {
        *slot.lock().unwrap() = Some(result);
    })
}

#[tokio::test]
async fn test_request_between_running_apps() {
    let renderer = MockRenderer::new();
    let (mut orch, _) = setup(&Config::default(), &renderer, &["calendar", "notes"]);
    orch.launch_app(&test_app_name("calendar")).unwrap();
    orch.launch_app(&test_app_name("notes")).unwrap();

    let bus = orch.messaging().clone();
    bus.register_handler(app_endpoint("calendar"), calendar_responder(bus.clone()));

    let outcome: Outcome = Arc::default();
    bus.send_request(
        app_endpoint("notes"),
        app_endpoint("calendar"),
        "events:list",
        json!({ "day": "2026-10-17" }),
        outcome_callback(&outcome),
        None,
    );

    let result = outcome.lock().unwrap().take().unwrap();
    assert_eq!(result.unwrap(), json!({ "events": ["standup", "review"] }));
    assert_eq!(bus.pending_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_request_times_out_with_configured_default() {
    let mut config = Config::default();
    config.messaging.request_timeout_ms = 200;
    let renderer = MockRenderer::new();
    let (mut orch, _) = setup(&config, &renderer, &["calendar", "notes"]);
    orch.launch_app(&test_app_name("notes")).unwrap();
    assert_eq!(orch.messaging().request_timeout(), Duration::from_millis(200));

    // Calendar is not running, so the request waits in its queue.
    let outcome: Outcome = Arc::default();
    orch.messaging().send_request(
        app_endpoint("notes"),
        app_endpoint("calendar"),
        "events:list",
        Value::Null,
        outcome_callback(&outcome),
        None,
    );
    assert!(outcome.lock().unwrap().is_none());
    assert_eq!(orch.messaging().queued_count(&app_endpoint("calendar")), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(matches!(
        outcome.lock().unwrap().take(),
        Some(Err(RequestError::TimedOut))
    ));
    assert_eq!(orch.messaging().pending_requests(), 0);
}

#[tokio::test]
async fn test_queued_messages_reach_app_once_it_listens() {
    let renderer = MockRenderer::new();
    let (mut orch, recorder) = setup(&Config::default(), &renderer, &["notes"]);
    let bus = orch.messaging().clone();

    bus.send_message(app_endpoint("clock"), app_endpoint("notes"), "tick", json!(1));
    bus.send_message(app_endpoint("clock"), app_endpoint("notes"), "tick", json!(2));
    assert_eq!(recorder.count_of("message_queued"), 2);

    orch.launch_app(&test_app_name("notes")).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: MessageHandler = Arc::new(move |message: &Message| -> Result<(), HandlerError> {
        sink.lock().unwrap().push(message.data().clone());
        Ok(())
    });
    assert_eq!(bus.register_handler(app_endpoint("notes"), handler), 2);
    assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2)]);
    assert_eq!(recorder.count_of("message_delivered"), 2);
}

#[tokio::test]
async fn test_broadcast_reaches_other_running_apps() {
    let renderer = MockRenderer::new();
    let (mut orch, _) = setup(&Config::default(), &renderer, &["a", "b", "c"]);
    let bus = orch.messaging().clone();
    let hits = Arc::new(Mutex::new(Vec::new()));

    for app in ["a", "b", "c"] {
        orch.launch_app(&test_app_name(app)).unwrap();
        let sink = Arc::clone(&hits);
        let handler: MessageHandler = Arc::new(move |message: &Message| -> Result<(), HandlerError> {
            if message.kind() == "theme:changed" {
                sink.lock().unwrap().push(app);
            }
            Ok(())
        });
        bus.register_handler(app_endpoint(app), handler);
    }

    let delivered = bus.broadcast(&app_endpoint("a"), "theme:changed", &json!({ "dark": true }));
    assert_eq!(delivered, 2);
    assert_eq!(*hits.lock().unwrap(), vec!["b", "c"]);
}

// ---------------------------------------------------------------------------
// Configuration and discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_config_file_drives_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r"
[focus]
history_capacity = 2

[messaging]
request_timeout_ms = 750
",
    )
    .unwrap();

    let config = Config::load_file(&path).unwrap();
    let orch = Orchestrator::from_config(&config, Arc::new(MockRenderer::new()));

    assert_eq!(orch.messaging().request_timeout(), Duration::from_millis(750));
    assert_eq!(orch.focus().history().capacity(), 2);
    assert_eq!(orch.resources().limits().per_app_memory_limit, 500 * MB);
}

#[tokio::test]
async fn test_discovered_apps_can_launch() {
    init_test_tracing();
    let root = tempfile::tempdir().unwrap();
    for app in ["clock", "weather"] {
        let dir = root.path().join(app);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), test_manifest_json(app)).unwrap();
    }
    let broken = root.path().join("broken");
    fs::create_dir_all(&broken).unwrap();
    fs::write(broken.join(MANIFEST_FILE_NAME), "{ not json").unwrap();

    let renderer = MockRenderer::new();
    let mut orch = Orchestrator::new(Arc::new(renderer.clone()));
    let failures = orch.discover_apps(&[root.path()]);

    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.starts_with(&broken));
    assert_eq!(orch.registry().len(), 2);

    orch.launch_app(&test_app_name("weather")).unwrap();
    assert!(orch.is_running(&test_app_name("weather")));
    assert_eq!(renderer.created_count(), 1);
}
