//! The lifecycle orchestrator.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use mosaic_apps::{
    AppManifest, AppManifestRecord, AppRegistry, RegistryError, Renderer, discover_manifests,
};
use mosaic_config::Config;
use mosaic_core::{AppName, Endpoint, ViewHandle};
use mosaic_events::{EventBus, EventMetadata, ShellEvent};
use mosaic_focus::FocusManager;
use mosaic_messaging::MessageBus;
use mosaic_permissions::{AuditEntry, Enforcer, PermissionStore};
use mosaic_resources::{ResourceReport, ResourceTracker};
use tracing::{debug, info, warn};

use crate::config_bridge::to_resource_limits;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::instance::{AppInstance, AppState};

const EVENT_SOURCE: &str = "orchestrator";

/// System message sent to an app losing focus.
pub const PAUSED_MESSAGE: &str = "paused";
/// System message sent to an app gaining focus.
pub const RESUMED_MESSAGE: &str = "resumed";
/// System message sent to an app about to close.
pub const WILL_CLOSE_MESSAGE: &str = "willClose";

/// Owns every running app and drives launch, focus and close.
///
/// All mutation goes through `&mut self`; the services it composes are
/// reachable read-only for queries and for apps to register message
/// handlers or check permissions.
pub struct Orchestrator {
    events: EventBus,
    registry: AppRegistry,
    permissions: Arc<PermissionStore>,
    resources: ResourceTracker,
    focus: FocusManager,
    messaging: MessageBus,
    renderer: Arc<dyn Renderer>,
    /// Running instances in launch order.
    instances: Vec<AppInstance>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registered", &self.registry.len())
            .field("instances", &self.instances)
            .field("focused", &self.focus.focused())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator with default configuration.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self::from_config(&Config::default(), renderer)
    }

    /// Create an orchestrator whose services follow `config`.
    #[must_use]
    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        let events = EventBus::new();
        let resources = ResourceTracker::new(to_resource_limits(&config.resources), events.clone());
        let messaging =
            MessageBus::with_request_timeout(events.clone(), config.messaging.request_timeout());

        Self {
            registry: AppRegistry::new(),
            permissions: Arc::new(PermissionStore::new()),
            resources,
            focus: FocusManager::with_history_capacity(config.focus.history_capacity),
            messaging,
            renderer,
            events,
            instances: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a validated manifest and its permission grants.
    ///
    /// Replaces any previous registration under the same name. A running
    /// instance keeps running with the new grants.
    pub fn register_app(&mut self, record: AppManifestRecord) -> &AppManifestRecord {
        let name = record.name().clone();
        self.permissions.register_app(name.clone(), record.grant().clone());
        info!(app = %name, version = %record.version(), "App registered");
        self.registry.insert(record)
    }

    /// Validate and register a raw manifest.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidManifest`] if validation fails.
    pub fn register_manifest(&mut self, manifest: AppManifest) -> OrchestratorResult<&AppManifestRecord> {
        let record = manifest.validate()?;
        Ok(self.register_app(record))
    }

    /// Register every manifest found under `roots`.
    ///
    /// Returns the manifests that could not be loaded; they never stop the
    /// others from registering.
    pub fn discover_apps<P: AsRef<Path>>(&mut self, roots: &[P]) -> Vec<(PathBuf, RegistryError)> {
        let discovery = discover_manifests(roots);
        for (record, path) in discovery.records {
            debug!(app = %record.name(), path = %path.display(), "Discovered manifest");
            self.register_app(record);
        }
        for (path, error) in &discovery.failures {
            warn!(path = %path.display(), error = %error, "Skipping unloadable manifest");
        }
        discovery.failures
    }

    /// Remove an app's manifest and permission grants.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AlreadyRunning`] while an instance is
    /// live, or [`OrchestratorError::AppNotFound`] if nothing is registered.
    pub fn unregister_app(&mut self, name: &AppName) -> OrchestratorResult<AppManifestRecord> {
        if self.is_running(name) {
            return Err(OrchestratorError::AlreadyRunning(name.clone()));
        }
        let record = self
            .registry
            .unregister(name)
            .map_err(|_| OrchestratorError::AppNotFound(name.clone()))?;
        self.permissions.revoke_app(name);
        info!(app = %name, "App unregistered");
        Ok(record)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Launch an app, or focus it if it is already running.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AppNotFound`] if no manifest is
    /// registered, or [`OrchestratorError::LaunchFailed`] if the renderer
    /// fails. A failed launch leaves nothing behind.
    pub fn launch_app(&mut self, name: &AppName) -> OrchestratorResult<&AppInstance> {
        if self.is_running(name) {
            debug!(app = %name, "Already running, focusing");
            self.focus_app(name)?;
            return self.require_instance(name);
        }

        let manifest = self
            .registry
            .get(name)
            .map_err(|_| OrchestratorError::AppNotFound(name.clone()))?
            .clone();

        info!(app = %name, entrypoint = manifest.entrypoint(), "Launching app");
        let view = match self.renderer.create_view(&manifest) {
            Ok(view) => view,
            Err(e) => {
                warn!(app = %name, error = %e, "App failed to launch");
                self.events.publish(ShellEvent::AppFailed {
                    metadata: EventMetadata::new(EVENT_SOURCE),
                    app: name.clone(),
                    reason: e.to_string(),
                });
                return Err(OrchestratorError::LaunchFailed {
                    app: name.clone(),
                    reason: e.to_string(),
                });
            },
        };

        let window_type = manifest.window_type();
        let mut instance = AppInstance::new(name.clone(), window_type, Arc::clone(&view));

        instance.z_order =
            self.focus
                .register(name.clone(), window_type, window_type.layer(), Arc::downgrade(&view));

        let weak: Weak<dyn ViewHandle> = Arc::downgrade(&view);
        self.resources.track(
            name.clone(),
            Box::new(move || weak.upgrade().and_then(|view| view.memory_sample())),
        );

        instance.state = AppState::Running;
        let z_order = instance.z_order;
        self.instances.push(instance);
        self.sync_z_orders();

        info!(app = %name, z_order, window_type = window_type.as_str(), "App launched");
        self.events.publish(ShellEvent::AppLaunched {
            metadata: EventMetadata::new(EVENT_SOURCE),
            app: name.clone(),
            z_order,
        });

        self.focus_app(name)?;
        self.require_instance(name)
    }

    /// Close a running app.
    ///
    /// Sends `willClose` if the app has a message handler, then releases
    /// everything the app held and destroys its view. If it had focus, the
    /// most recently launched remaining app is focused.
    ///
    /// Returns `false` if the app was not running.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Focus`] only if refocusing fails.
    pub fn close_app(&mut self, name: &AppName) -> OrchestratorResult<bool> {
        let Some(index) = self.index_of(name) else {
            warn!(app = %name, "Close requested for app that is not running");
            return Ok(false);
        };

        if let Some(instance) = self.instances.get_mut(index) {
            instance.state = AppState::Closing;
        }
        info!(app = %name, "Closing app");

        let endpoint = Endpoint::App(name.clone());
        if self.messaging.has_handler(&endpoint) {
            let delivery = self.messaging.send_message(
                Endpoint::System,
                endpoint.clone(),
                WILL_CLOSE_MESSAGE,
                serde_json::Value::Null,
            );
            debug!(app = %name, ?delivery, "Sent willClose");
        }

        let instance = self.instances.remove(index);
        let was_focused = self.focus.is_focused(name);

        self.resources.untrack(name);
        self.focus.unregister(name);
        self.messaging.unregister_handler(&endpoint);
        self.messaging.clear_queue(&endpoint);
        instance.view().destroy();
        drop(instance);

        info!(app = %name, "App closed");
        self.events.publish(ShellEvent::AppClosed {
            metadata: EventMetadata::new(EVENT_SOURCE),
            app: name.clone(),
        });

        if was_focused {
            match self.instances.last().map(|i| i.name().clone()) {
                Some(next) => self.focus_app(&next)?,
                None => {
                    self.focus.clear_focus();
                },
            }
        }
        Ok(true)
    }

    /// Close every running app, most recently launched first.
    ///
    /// Returns the number closed.
    pub fn shutdown(&mut self) -> usize {
        let names: Vec<AppName> = self.instances.iter().rev().map(|i| i.name().clone()).collect();
        info!(count = names.len(), "Shutting down");

        let mut closed: usize = 0;
        for name in names {
            match self.close_app(&name) {
                Ok(true) => closed = closed.saturating_add(1),
                Ok(false) => {},
                Err(e) => warn!(app = %name, error = %e, "Close during shutdown failed"),
            }
        }
        closed
    }

    // ---------------------------------------------------------------------
    // Focus
    // ---------------------------------------------------------------------

    /// Focus a running app, pausing the previous focus holder.
    ///
    /// Focusing the app that already has focus changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AppNotFound`] if the app is not running.
    pub fn focus_app(&mut self, name: &AppName) -> OrchestratorResult<()> {
        if !self.is_running(name) {
            return Err(OrchestratorError::AppNotFound(name.clone()));
        }
        let previous = self.focus.focused().cloned();
        if previous.as_ref() == Some(name) {
            return Ok(());
        }

        let change = self.focus.request_focus(name)?;
        if let Some(prev) = &previous {
            self.pause(prev);
        }
        if let Some(instance) = self.instance_mut(name) {
            instance.is_paused = false;
            instance.state = AppState::Running;
        }
        self.sync_z_orders();

        info!(app = %name, previous = ?previous.as_ref().map(AppName::as_str), "App focused");
        self.events.publish(ShellEvent::AppFocused {
            metadata: EventMetadata::new(EVENT_SOURCE),
            app: name.clone(),
            previous: change.previous,
        });
        self.notify(name, RESUMED_MESSAGE);
        Ok(())
    }

    /// Focus the next running app in launch order, wrapping around.
    ///
    /// Starts from the first app when nothing is focused. Returns the newly
    /// focused app, or `None` when nothing is running.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Focus`] if focus bookkeeping is
    /// inconsistent.
    pub fn focus_next_app(&mut self) -> OrchestratorResult<Option<AppName>> {
        self.cycle(true)
    }

    /// Focus the previous running app in launch order, wrapping around.
    ///
    /// Starts from the last app when nothing is focused.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Focus`] if focus bookkeeping is
    /// inconsistent.
    pub fn focus_previous_app(&mut self) -> OrchestratorResult<Option<AppName>> {
        self.cycle(false)
    }

    /// Re-focus the app that had focus before the current one.
    ///
    /// Returns `None` when history holds fewer than two apps.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Focus`] if focus bookkeeping is
    /// inconsistent.
    pub fn focus_previous_in_history(&mut self) -> OrchestratorResult<Option<AppName>> {
        let Some(target) = self.focus.previous_in_history().cloned() else {
            return Ok(None);
        };
        if !self.is_running(&target) {
            return Ok(None);
        }
        self.focus_app(&target)?;
        Ok(Some(target))
    }

    /// Raise an app to the front of its layer without focusing it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::AppNotFound`] if the app is not running.
    pub fn bring_to_front(&mut self, name: &AppName) -> OrchestratorResult<i64> {
        if !self.is_running(name) {
            return Err(OrchestratorError::AppNotFound(name.clone()));
        }
        let z = self.focus.bring_to_front(name)?;
        self.sync_z_orders();
        Ok(z)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Per-app permission enforcer.
    #[must_use]
    pub fn enforcer(&self, name: &AppName) -> Enforcer {
        self.permissions.enforcer(name.clone())
    }

    /// Running instances in launch order.
    #[must_use]
    pub fn list_running_apps(&self) -> Vec<&AppInstance> {
        self.instances.iter().collect()
    }

    /// A running instance.
    #[must_use]
    pub fn instance(&self, name: &AppName) -> Option<&AppInstance> {
        self.instances.iter().find(|i| i.name() == name)
    }

    /// Whether an instance of the app exists.
    #[must_use]
    pub fn is_running(&self, name: &AppName) -> bool {
        self.instance(name).is_some()
    }

    /// Lifecycle state of an app; `NotRunning` when no instance exists.
    #[must_use]
    pub fn app_state(&self, name: &AppName) -> AppState {
        self.instance(name).map_or(AppState::NotRunning, AppInstance::state)
    }

    /// The focused app.
    #[must_use]
    pub fn focused_app(&self) -> Option<&AppName> {
        self.focus.focused()
    }

    /// Resource usage snapshot.
    #[must_use]
    pub fn resource_report(&self) -> ResourceReport {
        self.resources.report()
    }

    /// Every permission check made so far.
    #[must_use]
    pub fn permission_audit_log(&self) -> Vec<AuditEntry> {
        self.permissions.audit_log()
    }

    /// The signal bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The messaging bus.
    #[must_use]
    pub fn messaging(&self) -> &MessageBus {
        &self.messaging
    }

    /// The permission store.
    #[must_use]
    pub fn permissions(&self) -> &Arc<PermissionStore> {
        &self.permissions
    }

    /// The resource tracker.
    #[must_use]
    pub fn resources(&self) -> &ResourceTracker {
        &self.resources
    }

    /// The app registry.
    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// The focus manager.
    #[must_use]
    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn index_of(&self, name: &AppName) -> Option<usize> {
        self.instances.iter().position(|i| i.name() == name)
    }

    fn instance_mut(&mut self, name: &AppName) -> Option<&mut AppInstance> {
        self.instances.iter_mut().find(|i| i.name() == name)
    }

    fn require_instance(&self, name: &AppName) -> OrchestratorResult<&AppInstance> {
        self.instance(name)
            .ok_or_else(|| OrchestratorError::AppNotFound(name.clone()))
    }

    /// Copy z-orders back from the focus manager. A raise can renumber
    /// every surface in the layer, not only the raised one.
    fn sync_z_orders(&mut self) {
        for instance in &mut self.instances {
            if let Some(z) = self.focus.z_order(instance.name()) {
                instance.z_order = z;
            }
        }
    }

    fn pause(&mut self, name: &AppName) {
        let Some(instance) = self.instance_mut(name) else {
            return;
        };
        instance.is_paused = true;
        instance.state = AppState::Paused;

        debug!(app = %name, "App paused");
        self.events.publish(ShellEvent::AppPaused {
            metadata: EventMetadata::new(EVENT_SOURCE),
            app: name.clone(),
        });
        self.notify(name, PAUSED_MESSAGE);
    }

    /// Send a system message if the app listens for messages.
    fn notify(&self, name: &AppName, kind: &str) {
        let endpoint = Endpoint::App(name.clone());
        if self.messaging.has_handler(&endpoint) {
            self.messaging
                .send_message(Endpoint::System, endpoint, kind, serde_json::Value::Null);
        }
    }

    fn cycle(&mut self, forward: bool) -> OrchestratorResult<Option<AppName>> {
        let count = self.instances.len();
        if count == 0 {
            return Ok(None);
        }
        let current = self.focus.focused().and_then(|name| self.index_of(name));
        let target = match (current, forward) {
            (Some(i), true) => i.checked_add(1).filter(|&n| n < count).unwrap_or(0),
            (Some(i), false) => i.checked_sub(1).unwrap_or(count.saturating_sub(1)),
            (None, true) => 0,
            (None, false) => count.saturating_sub(1),
        };
        let Some(name) = self.instances.get(target).map(|i| i.name().clone()) else {
            return Ok(None);
        };
        self.focus_app(&name)?;
        Ok(Some(name))
    }
}
