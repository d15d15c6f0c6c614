//! Running app instances.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mosaic_core::{AppName, ViewHandle, WindowType};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an app.
///
/// `NotRunning -> Launching -> Running <-> Paused -> Closing -> NotRunning`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// No instance exists.
    #[default]
    NotRunning,
    /// The view is being created.
    Launching,
    /// Running and focused, or running without having been paused.
    Running,
    /// Running but another app holds focus.
    Paused,
    /// Being torn down.
    Closing,
}

impl AppState {
    /// Whether an instance exists in this state.
    #[must_use]
    pub fn is_live(self) -> bool {
        !matches!(self, Self::NotRunning)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotRunning => "not_running",
            Self::Launching => "launching",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Closing => "closing",
        };
        f.write_str(s)
    }
}

/// A running app.
///
/// Holds the only strong reference to the app's view; the focus manager
/// and resource sampler see it through weak references.
pub struct AppInstance {
    name: AppName,
    window_type: WindowType,
    view: Arc<dyn ViewHandle>,
    pub(crate) z_order: i64,
    launched_at: DateTime<Utc>,
    pub(crate) is_paused: bool,
    pub(crate) state: AppState,
}

impl AppInstance {
    pub(crate) fn new(name: AppName, window_type: WindowType, view: Arc<dyn ViewHandle>) -> Self {
        Self {
            name,
            window_type,
            view,
            z_order: 0,
            launched_at: Utc::now(),
            is_paused: false,
            state: AppState::Launching,
        }
    }

    /// App name.
    #[must_use]
    pub fn name(&self) -> &AppName {
        &self.name
    }

    /// Window type from the manifest.
    #[must_use]
    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// The app's view.
    #[must_use]
    pub fn view(&self) -> &Arc<dyn ViewHandle> {
        &self.view
    }

    /// Render order last assigned by the focus manager.
    #[must_use]
    pub fn z_order(&self) -> i64 {
        self.z_order
    }

    /// When the instance was created.
    #[must_use]
    pub fn launched_at(&self) -> DateTime<Utc> {
        self.launched_at
    }

    /// Whether the app was paused because another app took focus.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> AppState {
        self.state
    }
}

impl fmt::Debug for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInstance")
            .field("name", &self.name)
            .field("window_type", &self.window_type)
            .field("z_order", &self.z_order)
            .field("launched_at", &self.launched_at)
            .field("is_paused", &self.is_paused)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_matches_serde() {
        for state in [
            AppState::NotRunning,
            AppState::Launching,
            AppState::Running,
            AppState::Paused,
            AppState::Closing,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn test_only_not_running_is_not_live() {
        assert!(!AppState::NotRunning.is_live());
        assert!(AppState::Paused.is_live());
        assert_eq!(AppState::default(), AppState::NotRunning);
    }
}
