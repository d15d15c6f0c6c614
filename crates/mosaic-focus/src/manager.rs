//! Focus and z-order manager.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use mosaic_core::{AppName, LAYER_SPAN, Layer, ViewHandle, WindowType};
use tracing::{debug, trace};

use crate::error::{FocusError, FocusResult};
use crate::history::FocusHistory;

/// Outcome of a focus request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusChange {
    /// The app focused before the request, if any.
    pub previous: Option<AppName>,
    /// The app focused now.
    pub current: AppName,
}

impl FocusChange {
    /// Whether focus moved to a different app.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous.as_ref() != Some(&self.current)
    }
}

#[derive(Debug)]
struct Surface {
    name: AppName,
    window_type: WindowType,
    layer: Layer,
    view: Weak<dyn ViewHandle>,
    z_order: i64,
}

impl Surface {
    fn view(&self) -> Option<Arc<dyn ViewHandle>> {
        self.view.upgrade()
    }
}

/// Tracks focus, focus history and stacking order of registered surfaces.
///
/// Surfaces are kept in registration order, which is also the order used
/// by [`focus_next`](Self::focus_next) and
/// [`focus_previous`](Self::focus_previous). Views are held weakly; the app
/// instance owns them.
#[derive(Debug, Default)]
pub struct FocusManager {
    surfaces: Vec<Surface>,
    focused: Option<AppName>,
    history: FocusHistory,
    counters: HashMap<Layer, i64>,
}

impl FocusManager {
    /// Create a manager with the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager keeping at most `capacity` history entries.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: FocusHistory::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Register a surface and assign it the next z-order in `layer`.
    ///
    /// Registering a name again replaces the surface in place and assigns
    /// a fresh z-order. Returns the assigned value.
    pub fn register(
        &mut self,
        name: AppName,
        window_type: WindowType,
        layer: Layer,
        view: Weak<dyn ViewHandle>,
    ) -> i64 {
        let z_order = self.next_z(layer);
        if let Some(view) = view.upgrade() {
            view.set_z_order(z_order);
        }
        debug!(app = %name, window_type = window_type.as_str(), ?layer, z_order, "Surface registered");

        let surface = Surface {
            name,
            window_type,
            layer,
            view,
            z_order,
        };
        match self.surfaces.iter_mut().find(|s| s.name == surface.name) {
            Some(existing) => *existing = surface,
            None => self.surfaces.push(surface),
        }
        z_order
    }

    /// Remove a surface, purge it from history and drop focus if it had it.
    ///
    /// Returns `true` if the surface was registered.
    pub fn unregister(&mut self, name: &AppName) -> bool {
        let Some(index) = self.surfaces.iter().position(|s| &s.name == name) else {
            return false;
        };
        self.surfaces.remove(index);
        self.history.remove(name);
        if self.focused.as_ref() == Some(name) {
            self.focused = None;
            debug!(app = %name, "Focused surface unregistered, focus cleared");
        }
        debug!(app = %name, "Surface unregistered");
        true
    }

    /// Give focus to a surface.
    ///
    /// Calls `force_focus` on the view, records the app in history and, for
    /// widgets only, raises it to the front of its layer.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NotRegistered`] if the app has no surface.
    pub fn request_focus(&mut self, name: &AppName) -> FocusResult<FocusChange> {
        let index = self.index_of(name)?;
        let previous = self.focused.replace(name.clone());

        let (view, raises) = self
            .surfaces
            .get(index)
            .map_or((None, false), |s| (s.view(), s.window_type.raises_on_focus()));
        if let Some(view) = view {
            view.force_focus();
        }
        if raises {
            self.raise(index, false);
        }
        self.history.touch(name);

        let change = FocusChange {
            previous,
            current: name.clone(),
        };
        if change.changed() {
            debug!(
                app = %name,
                previous = ?change.previous.as_ref().map(AppName::as_str),
                "Focus changed"
            );
        }
        Ok(change)
    }

    /// Drop focus without focusing anything else.
    ///
    /// Returns the app that had focus.
    pub fn clear_focus(&mut self) -> Option<AppName> {
        let previous = self.focused.take();
        if let Some(app) = &previous {
            debug!(app = %app, "Focus cleared");
        }
        previous
    }

    /// Raise a surface to the front of its layer, whatever its type.
    ///
    /// Always assigns a fresh z-order, so successive calls return strictly
    /// increasing values (until the layer is compacted). Returns the
    /// surface's z-order afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NotRegistered`] if the app has no surface.
    pub fn bring_to_front(&mut self, name: &AppName) -> FocusResult<i64> {
        let index = self.index_of(name)?;
        Ok(self.raise(index, true))
    }

    /// Focus the next widget in registration order, wrapping around.
    ///
    /// Starts from the first widget when no widget is focused. Returns
    /// `None` when there are no widgets.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NotRegistered`] only if internal state is
    /// inconsistent.
    pub fn focus_next(&mut self) -> FocusResult<Option<FocusChange>> {
        self.cycle_widgets(true)
    }

    /// Focus the previous widget in registration order, wrapping around.
    ///
    /// Starts from the last widget when no widget is focused.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NotRegistered`] only if internal state is
    /// inconsistent.
    pub fn focus_previous(&mut self) -> FocusResult<Option<FocusChange>> {
        self.cycle_widgets(false)
    }

    /// Re-focus the app focused before the current one.
    ///
    /// Returns `None` with fewer than two history entries.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError::NotRegistered`] if the history entry no longer
    /// has a surface.
    pub fn focus_previous_in_history(&mut self) -> FocusResult<Option<FocusChange>> {
        match self.previous_in_history().cloned() {
            Some(target) => self.request_focus(&target).map(Some),
            None => Ok(None),
        }
    }

    /// The app focused before the current one, without changing focus.
    #[must_use]
    pub fn previous_in_history(&self) -> Option<&AppName> {
        self.history.previous()
    }

    /// The focused app.
    #[must_use]
    pub fn focused(&self) -> Option<&AppName> {
        self.focused.as_ref()
    }

    /// Whether `name` has focus.
    #[must_use]
    pub fn is_focused(&self, name: &AppName) -> bool {
        self.focused.as_ref() == Some(name)
    }

    /// Focus history, oldest first.
    #[must_use]
    pub fn history(&self) -> &FocusHistory {
        &self.history
    }

    /// Current z-order of a surface.
    #[must_use]
    pub fn z_order(&self, name: &AppName) -> Option<i64> {
        self.surface(name).map(|s| s.z_order)
    }

    /// Layer of a surface.
    #[must_use]
    pub fn layer(&self, name: &AppName) -> Option<Layer> {
        self.surface(name).map(|s| s.layer)
    }

    /// Whether a surface is registered for `name`.
    #[must_use]
    pub fn is_registered(&self, name: &AppName) -> bool {
        self.surface(name).is_some()
    }

    /// Surfaces in one layer, back to front.
    #[must_use]
    pub fn stacking(&self, layer: Layer) -> Vec<&AppName> {
        let mut in_layer: Vec<&Surface> = self.surfaces.iter().filter(|s| s.layer == layer).collect();
        in_layer.sort_by_key(|s| s.z_order);
        in_layer.into_iter().map(|s| &s.name).collect()
    }

    /// Number of registered surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether no surface is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    fn surface(&self, name: &AppName) -> Option<&Surface> {
        self.surfaces.iter().find(|s| &s.name == name)
    }

    fn index_of(&self, name: &AppName) -> FocusResult<usize> {
        self.surfaces
            .iter()
            .position(|s| &s.name == name)
            .ok_or_else(|| FocusError::NotRegistered(name.clone()))
    }

    /// Next value from the layer's counter.
    ///
    /// Values stay inside the layer's band: once the counter would reach
    /// [`LAYER_SPAN`], the layer is compacted first.
    fn next_z(&mut self, layer: Layer) -> i64 {
        let current = self.counters.get(&layer).copied().unwrap_or(0);
        let counter = if current.saturating_add(1) >= LAYER_SPAN {
            self.compact(layer).saturating_add(1)
        } else {
            current.saturating_add(1)
        };
        self.counters.insert(layer, counter);
        layer.base().saturating_add(counter)
    }

    /// Renumber a layer's surfaces to `base + 1..=n` keeping their stacking
    /// order. Returns `n`.
    fn compact(&mut self, layer: Layer) -> i64 {
        let mut order: Vec<usize> = self
            .surfaces
            .iter()
            .enumerate()
            .filter(|(_, s)| s.layer == layer)
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| self.surfaces.get(i).map_or(0, |s| s.z_order));

        let mut assigned: i64 = 0;
        for index in order {
            assigned = assigned.saturating_add(1);
            if let Some(surface) = self.surfaces.get_mut(index) {
                surface.z_order = layer.base().saturating_add(assigned);
                if let Some(view) = surface.view() {
                    view.set_z_order(surface.z_order);
                }
            }
        }
        debug!(?layer, surfaces = assigned, "Layer z-order compacted");
        assigned
    }

    /// Move a surface above everything else in its layer.
    ///
    /// Unless `force` is set, a surface already in front keeps its value.
    fn raise(&mut self, index: usize, force: bool) -> i64 {
        let Some(surface) = self.surfaces.get(index) else {
            return 0;
        };
        let (layer, current) = (surface.layer, surface.z_order);
        let already_front = self
            .surfaces
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != index && s.layer == layer)
            .all(|(_, s)| s.z_order < current);
        if already_front && !force {
            trace!(app = %surface.name, z_order = current, "Surface already in front");
            return current;
        }

        let z_order = self.next_z(layer);
        if let Some(surface) = self.surfaces.get_mut(index) {
            surface.z_order = z_order;
            if let Some(view) = surface.view() {
                view.set_z_order(z_order);
            }
            debug!(app = %surface.name, z_order, "Surface raised");
        }
        z_order
    }

    fn cycle_widgets(&mut self, forward: bool) -> FocusResult<Option<FocusChange>> {
        let widgets: Vec<AppName> = self
            .surfaces
            .iter()
            .filter(|s| s.window_type == WindowType::Widget)
            .map(|s| s.name.clone())
            .collect();
        let last = widgets.len().saturating_sub(1);
        if widgets.is_empty() {
            return Ok(None);
        }

        let current = self
            .focused
            .as_ref()
            .and_then(|f| widgets.iter().position(|w| w == f));
        let target = match (current, forward) {
            (Some(i), true) => i.checked_add(1).filter(|n| *n <= last).unwrap_or(0),
            (Some(i), false) => i.checked_sub(1).unwrap_or(last),
            (None, true) => 0,
            (None, false) => last,
        };

        match widgets.get(target) {
            Some(name) => self.request_focus(name).map(Some),
            None => Ok(None),
        }
    }
}
