//! Window types and render layers.

use serde::{Deserialize, Serialize};

/// Width of the z-order band reserved for each layer.
pub const LAYER_SPAN: i64 = 1_000;

/// The window type declared in an app manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Free-floating desktop widget. The only type raised on focus.
    #[default]
    Widget,
    /// Edge-docked panel.
    Panel,
    /// Full-surface overlay.
    Overlay,
    /// Modal dialog.
    Dialog,
}

impl WindowType {
    /// The render layer windows of this type are stacked in.
    #[must_use]
    pub const fn layer(self) -> Layer {
        match self {
            Self::Widget => Layer::Widget,
            Self::Panel => Layer::Panel,
            Self::Overlay => Layer::Overlay,
            Self::Dialog => Layer::Notification,
        }
    }

    /// Whether focusing a window of this type brings it to the front.
    #[must_use]
    pub const fn raises_on_focus(self) -> bool {
        matches!(self, Self::Widget)
    }

    /// Stable string token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Widget => "widget",
            Self::Panel => "panel",
            Self::Overlay => "overlay",
            Self::Dialog => "dialog",
        }
    }
}

/// Coarse render-stacking layers, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Panels.
    Panel,
    /// Docks.
    Dock,
    /// Widgets.
    Widget,
    /// Notifications and dialogs.
    Notification,
    /// Overlays.
    Overlay,
}

impl Layer {
    /// All layers from bottom to top.
    pub const ALL: [Self; 5] = [
        Self::Panel,
        Self::Dock,
        Self::Widget,
        Self::Notification,
        Self::Overlay,
    ];

    /// Fixed z-order base offset for the layer.
    #[must_use]
    pub const fn base(self) -> i64 {
        match self {
            Self::Panel => 1_000,
            Self::Dock => 2_000,
            Self::Widget => 3_000,
            Self::Notification => 4_000,
            Self::Overlay => 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_bases_are_ordered() {
        for pair in Layer::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].base() + LAYER_SPAN <= pair[1].base());
        }
    }

    #[test]
    fn only_widgets_raise_on_focus() {
        assert!(WindowType::Widget.raises_on_focus());
        assert!(!WindowType::Panel.raises_on_focus());
        assert!(!WindowType::Overlay.raises_on_focus());
        assert!(!WindowType::Dialog.raises_on_focus());
    }

    #[test]
    fn window_type_serde_is_lowercase() {
        let parsed: WindowType = serde_json::from_str("\"overlay\"").unwrap();
        assert_eq!(parsed, WindowType::Overlay);
        assert_eq!(WindowType::Dialog.layer(), Layer::Notification);
    }
}
