use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};

/// Manages the current view of the map: center, zoom, and screen dimensions.
///
/// The map surface is the source of truth for the live view; this struct is
/// the engine's mirror of it, used for pure coordinate math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 18.0),
            size,
            min_zoom: 0.0,
            max_zoom: 18.0,
        }
    }

    /// Sets the center of the viewport, clamped to the projectable world
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(
            LatLng::clamp_lat(center.lat),
            center.lng.clamp(-180.0, 180.0),
        );
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// The current zoom floored to the integer level the clusterer works at
    pub fn cluster_zoom(&self) -> u8 {
        self.zoom.clamp(0.0, self.max_zoom).floor() as u8
    }

    /// Projects the viewport center to world pixels at the current zoom
    fn center_pixel(&self) -> Point {
        self.center.project_at(self.cluster_zoom())
    }

    /// Converts a geographical coordinate to container-relative screen pixels
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let world = lat_lng.project_at(self.cluster_zoom());
        let origin = self.center_pixel();
        Point::new(
            world.x - origin.x + self.size.x / 2.0,
            world.y - origin.y + self.size.y / 2.0,
        )
    }

    /// Converts container-relative screen pixels back to a geographical coordinate
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let origin = self.center_pixel();
        let world = Point::new(
            pixel.x + origin.x - self.size.x / 2.0,
            pixel.y + origin.y - self.size.y / 2.0,
        );
        LatLng::unproject_at(world, self.cluster_zoom())
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}
