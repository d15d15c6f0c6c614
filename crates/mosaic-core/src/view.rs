//! The view handle contract implemented by the external renderer.

/// An opaque handle to a running app's content surface.
///
/// Produced by the renderer when an app launches and owned by the app
/// instance. Other services only ever hold weak references to it.
/// Implementations use interior mutability since handles are shared
/// behind `Arc`.
pub trait ViewHandle: Send + Sync {
    /// Current render order.
    fn z_order(&self) -> i64;

    /// Assign a new render order.
    fn set_z_order(&self, z: i64);

    /// Give the surface keyboard focus.
    fn force_focus(&self);

    /// Tear down the surface. Called exactly once when the app closes.
    fn destroy(&self);

    /// Sample the surface's current memory footprint in bytes.
    ///
    /// Returns `None` when the renderer cannot measure it.
    fn memory_sample(&self) -> Option<u64> {
        None
    }
}
