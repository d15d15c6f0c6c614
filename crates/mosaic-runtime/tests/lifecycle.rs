//! Integration tests for app lifecycle, focus and z-order.

use std::sync::{Arc, Mutex};

use mosaic_core::{Endpoint, Layer, ViewHandle, WindowType};
use mosaic_messaging::{HandlerError, Message, MessageHandler};
use mosaic_runtime::{AppState, Orchestrator, PAUSED_MESSAGE, RESUMED_MESSAGE, WILL_CLOSE_MESSAGE};
use mosaic_test::{
    MockRenderer, RecordingSubscriber, init_test_tracing, test_app_name, test_calendar_manifest,
    test_manifest, test_manifest_with,
};

fn orchestrator_with(apps: &[&str]) -> (Orchestrator, MockRenderer) {
    init_test_tracing();
    let renderer = MockRenderer::new();
    let mut orchestrator = Orchestrator::new(Arc::new(renderer.clone()));
    for app in apps {
        orchestrator.register_manifest(test_manifest(app)).unwrap();
    }
    (orchestrator, renderer)
}

fn inbox(orchestrator: &Orchestrator, app: &str) -> Arc<Mutex<Vec<String>>> {
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&kinds);
    let handler: MessageHandler = Arc::new(move |message: &Message| -> Result<(), HandlerError> {
        sink.lock().unwrap().push(message.kind().to_string());
        Ok(())
    });
    orchestrator
        .messaging()
        .register_handler(Endpoint::App(test_app_name(app)), handler);
    kinds
}

fn focused_count(orchestrator: &Orchestrator) -> usize {
    orchestrator
        .list_running_apps()
        .iter()
        .filter(|i| orchestrator.focused_app() == Some(i.name()))
        .count()
}

#[tokio::test]
async fn test_last_launched_is_focused_and_previous_is_paused() {
    let (mut orch, _) = orchestrator_with(&["calendar", "notes"]);
    let calendar = test_app_name("calendar");
    let notes = test_app_name("notes");

    orch.launch_app(&calendar).unwrap();
    orch.launch_app(&notes).unwrap();

    assert_eq!(orch.focused_app(), Some(&notes));
    assert_eq!(orch.app_state(&calendar), AppState::Paused);
    assert!(orch.instance(&calendar).unwrap().is_paused());
    assert_eq!(orch.app_state(&notes), AppState::Running);
    assert_eq!(focused_count(&orch), 1);
}

#[tokio::test]
async fn test_focus_previous_in_history_returns_to_calendar() {
    let (mut orch, _) = orchestrator_with(&["calendar", "notes"]);
    let calendar = test_app_name("calendar");
    let notes = test_app_name("notes");

    orch.launch_app(&calendar).unwrap();
    orch.launch_app(&notes).unwrap();

    assert_eq!(orch.focus_previous_in_history().unwrap(), Some(calendar.clone()));
    assert_eq!(orch.focused_app(), Some(&calendar));
    assert_eq!(orch.app_state(&notes), AppState::Paused);

    // And back again.
    assert_eq!(orch.focus_previous_in_history().unwrap(), Some(notes.clone()));
    assert_eq!(orch.focused_app(), Some(&notes));
}

#[tokio::test]
async fn test_closing_focused_app_refocuses_most_recent() {
    let (mut orch, renderer) = orchestrator_with(&["calendar", "notes", "clock"]);
    let calendar = test_app_name("calendar");
    let notes = test_app_name("notes");
    let clock = test_app_name("clock");

    orch.launch_app(&calendar).unwrap();
    orch.launch_app(&notes).unwrap();
    orch.launch_app(&clock).unwrap();
    orch.focus_app(&calendar).unwrap();

    // Closing an unfocused app leaves focus alone.
    assert!(orch.close_app(&clock).unwrap());
    assert_eq!(orch.focused_app(), Some(&calendar));

    // Closing the focused one picks the most recently launched survivor.
    assert!(orch.close_app(&calendar).unwrap());
    assert_eq!(orch.focused_app(), Some(&notes));
    assert_eq!(orch.app_state(&notes), AppState::Running);

    assert!(orch.close_app(&notes).unwrap());
    assert_eq!(orch.focused_app(), None);
    assert!(orch.list_running_apps().is_empty());

    for app in ["calendar", "notes", "clock"] {
        let view = renderer.view(app).unwrap();
        assert_eq!(view.destroy_count(), 1, "{app} destroyed once");
    }
}

#[tokio::test]
async fn test_close_releases_every_service() {
    let (mut orch, _) = orchestrator_with(&["notes"]);
    let notes = test_app_name("notes");
    let endpoint = Endpoint::App(notes.clone());

    orch.launch_app(&notes).unwrap();
    let kinds = inbox(&orch, "notes");

    assert!(orch.close_app(&notes).unwrap());
    assert_eq!(*kinds.lock().unwrap(), vec![WILL_CLOSE_MESSAGE]);

    assert!(!orch.is_running(&notes));
    assert_eq!(orch.app_state(&notes), AppState::NotRunning);
    assert!(!orch.resources().is_tracked(&notes));
    assert!(!orch.focus().is_registered(&notes));
    assert!(!orch.messaging().has_handler(&endpoint));

    // Messages sent after close wait for a future instance.
    orch.messaging()
        .send_message(Endpoint::System, endpoint.clone(), "hello", serde_json::Value::Null);
    assert_eq!(orch.messaging().queued_count(&endpoint), 1);

    // Relaunching does not clear the new queue; the app drains it itself.
    orch.launch_app(&notes).unwrap();
    assert_eq!(orch.messaging().queued_count(&endpoint), 1);
}

#[tokio::test]
async fn test_pause_and_resume_messages() {
    let (mut orch, _) = orchestrator_with(&["calendar", "notes"]);
    let calendar = test_app_name("calendar");
    let notes = test_app_name("notes");

    orch.launch_app(&calendar).unwrap();
    let calendar_inbox = inbox(&orch, "calendar");
    orch.launch_app(&notes).unwrap();
    let notes_inbox = inbox(&orch, "notes");

    orch.focus_app(&calendar).unwrap();

    assert_eq!(
        *calendar_inbox.lock().unwrap(),
        vec![PAUSED_MESSAGE, RESUMED_MESSAGE]
    );
    assert_eq!(*notes_inbox.lock().unwrap(), vec![PAUSED_MESSAGE]);
}

#[tokio::test]
async fn test_focus_signals() {
    let (mut orch, _) = orchestrator_with(&["calendar", "notes"]);
    let recorder = Arc::new(RecordingSubscriber::new());
    orch.events().registry().register(Arc::clone(&recorder) as _);

    orch.launch_app(&test_app_name("calendar")).unwrap();
    orch.launch_app(&test_app_name("notes")).unwrap();
    // Re-focusing the focused app is silent.
    orch.focus_app(&test_app_name("notes")).unwrap();

    assert_eq!(
        recorder.event_types(),
        vec![
            "app_launched",
            "app_focused",
            "app_launched",
            "app_paused",
            "app_focused",
        ]
    );
}

#[tokio::test]
async fn test_at_most_one_instance_per_name() {
    let (mut orch, renderer) = orchestrator_with(&["notes", "clock"]);
    let notes = test_app_name("notes");
    let clock = test_app_name("clock");

    for _ in 0..3 {
        orch.launch_app(&notes).unwrap();
        orch.launch_app(&clock).unwrap();
        assert_eq!(focused_count(&orch), 1);
    }

    assert_eq!(orch.list_running_apps().len(), 2);
    assert_eq!(renderer.created_count(), 2);
}

#[tokio::test]
async fn test_z_order_strictly_increases_within_layer() {
    let (mut orch, renderer) = orchestrator_with(&["a", "b", "c"]);
    let names = ["a", "b", "c"].map(test_app_name);

    let mut last = i64::MIN;
    for name in &names {
        let z = orch.launch_app(name).unwrap().z_order();
        assert!(z > last);
        last = z;
    }

    // Focusing a widget that is not in front raises it past everything.
    orch.focus_app(&names[0]).unwrap();
    let raised = orch.instance(&names[0]).unwrap().z_order();
    assert!(raised > last);
    assert_eq!(renderer.view("a").unwrap().z_order(), raised);

    let fronted = orch.bring_to_front(&names[1]).unwrap();
    assert!(fronted > raised);
    assert_eq!(
        orch.focus().stacking(Layer::Widget),
        vec![&names[2], &names[0], &names[1]]
    );
}

#[tokio::test]
async fn test_switching_widgets_never_climbs_over_dialogs() {
    init_test_tracing();
    let renderer = MockRenderer::new();
    let mut orch = Orchestrator::new(Arc::new(renderer.clone()));
    for name in ["a", "b"] {
        orch.register_manifest(test_manifest(name)).unwrap();
    }
    orch.register_manifest(test_manifest_with("confirm", WindowType::Dialog))
        .unwrap();
    let [a, b, confirm] = ["a", "b", "confirm"].map(test_app_name);

    orch.launch_app(&a).unwrap();
    orch.launch_app(&b).unwrap();
    let dialog_z = orch.launch_app(&confirm).unwrap().z_order();

    for _ in 0..600 {
        orch.focus_app(&a).unwrap();
        orch.focus_app(&b).unwrap();
    }

    let widget_z = orch.instance(&b).unwrap().z_order();
    assert!(widget_z < dialog_z);
    assert!(orch.instance(&a).unwrap().z_order() < widget_z);
    assert_eq!(renderer.view("a").unwrap().z_order(), orch.focus().z_order(&a).unwrap());
    assert_eq!(orch.focus().stacking(Layer::Widget), vec![&a, &b]);
}

#[tokio::test]
async fn test_focus_does_not_raise_non_widgets() {
    init_test_tracing();
    let renderer = MockRenderer::new();
    let mut orch = Orchestrator::new(Arc::new(renderer));
    orch.register_manifest(test_manifest_with("bar", WindowType::Panel))
        .unwrap();
    orch.register_manifest(test_manifest_with("dock-menu", WindowType::Panel))
        .unwrap();
    let bar = test_app_name("bar");
    let menu = test_app_name("dock-menu");

    let bar_z = orch.launch_app(&bar).unwrap().z_order();
    let menu_z = orch.launch_app(&menu).unwrap().z_order();
    assert!(menu_z > bar_z);

    orch.focus_app(&bar).unwrap();
    assert_eq!(orch.instance(&bar).unwrap().z_order(), bar_z);
    assert_eq!(orch.focused_app(), Some(&bar));
}

#[tokio::test]
async fn test_cycle_in_launch_order() {
    let (mut orch, _) = orchestrator_with(&["a", "b", "c"]);
    let [a, b, c] = ["a", "b", "c"].map(test_app_name);
    for name in [&a, &b, &c] {
        orch.launch_app(name).unwrap();
    }

    assert_eq!(orch.focus_next_app().unwrap(), Some(a.clone()));
    assert_eq!(orch.focus_next_app().unwrap(), Some(b.clone()));
    assert_eq!(orch.focus_previous_app().unwrap(), Some(a.clone()));
    assert_eq!(orch.focus_previous_app().unwrap(), Some(c.clone()));
    assert_eq!(orch.focused_app(), Some(&c));
}

#[tokio::test]
async fn test_shutdown_closes_in_reverse_launch_order() {
    let (mut orch, _) = orchestrator_with(&["a", "b", "c"]);
    let recorder = Arc::new(RecordingSubscriber::new());
    for app in ["a", "b", "c"] {
        orch.launch_app(&test_app_name(app)).unwrap();
    }
    orch.events().registry().register(Arc::clone(&recorder) as _);

    assert_eq!(orch.shutdown(), 3);
    assert!(orch.list_running_apps().is_empty());
    assert_eq!(orch.focused_app(), None);

    let closed: Vec<String> = recorder
        .events()
        .iter()
        .filter(|e| e.event_type() == "app_closed")
        .filter_map(|e| e.app().map(ToString::to_string))
        .collect();
    assert_eq!(closed, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_enforcer_follows_manifest_grants() {
    init_test_tracing();
    let mut orch = Orchestrator::new(Arc::new(MockRenderer::new()));
    orch.register_manifest(test_calendar_manifest()).unwrap();
    orch.register_manifest(test_manifest("notes")).unwrap();

    let calendar = orch.enforcer(&test_app_name("calendar"));
    assert!(calendar.enforce(mosaic_permissions::Category::Calendar, "read").is_ok());
    assert!(calendar
        .enforce_filesystem("/home/user/calendars/work.ics", mosaic_permissions::FsMode::Read)
        .is_ok());
    assert!(calendar
        .enforce_filesystem("/home/user/calendars/work.ics", mosaic_permissions::FsMode::Write)
        .is_err());
    assert!(calendar.enforce_network("CalDAV.example.com").is_ok());
    assert!(calendar.enforce_network("evil.example.com").is_err());

    let notes = orch.enforcer(&test_app_name("notes"));
    assert!(notes.enforce(mosaic_permissions::Category::Calendar, "read").is_err());

    let log = orch.permission_audit_log();
    assert_eq!(log.len(), 6);
    assert_eq!(log.iter().filter(|e| e.granted).count(), 3);
}
