use crate::{core::geo::{LatLng, LatLngBounds}, layers::markers::MarkerVisual};

/// Opaque handle to a marker the surface placed on its marker layer.
///
/// Handles are single-use: once passed to [`MapSurface::remove_marker`] they
/// must be discarded, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// The contract the engine consumes from the third-party map SDK.
///
/// Only this surface mutates the marker layer, via the engine's marker sync;
/// pan/zoom/tile internals stay on the other side of the trait.
pub trait MapSurface {
    /// Places a marker and returns its handle
    fn add_marker(&mut self, position: LatLng, visual: MarkerVisual) -> MarkerHandle;

    /// Removes a previously added marker; the handle is dead afterwards
    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Animates the view to the given center and zoom
    fn fly_to(&mut self, center: LatLng, zoom: f64);

    /// The currently visible geographic bounding box
    fn bounds(&self) -> LatLngBounds;

    /// The current zoom level
    fn zoom(&self) -> f64;
}
