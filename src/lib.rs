//! # pinmap
//!
//! The portable core of a travel/destination-pinning map application.
//!
//! Geotagged pins live in a remote store; this crate groups the in-viewport
//! pins into clusters per zoom level, keeps on-screen markers in sync with
//! every viewport change, routes marker clicks to cluster expansion or a pin
//! detail popup, and manages engagement counters and a local saved-pins list.
//! The interactive map renderer itself is an external collaborator reached
//! through the [`surface::MapSurface`] trait.

pub mod core;
pub mod events;
pub mod layers;
pub mod prelude;
pub mod remote;
pub mod spatial;
pub mod store;
pub mod surface;
pub mod ui;

// Re-export public API
pub use crate::core::{
    geo::{LatLng, LatLngBounds, Point},
    map::{PinDraft, PinMap},
    viewport::Viewport,
};

pub use layers::markers::{ClickAction, MarkerSync, MarkerVisual};

pub use spatial::{
    clustering::{ClusterConfig, ClusterPass, Clusterer, Feature},
    index::PinIndex,
};

pub use store::{
    counters::{CounterKind, Engagement},
    pins::{MemoryPinStore, NewPin, Pin, PinFilter, PinPatch, PinStore, PinSummary, RestPinStore},
    saved::{KeyValueStorage, MemoryStorage, SavedPins},
};

pub use remote::{
    geocode::{Geocoder, NominatimGeocoder, PlaceLabel},
    storage::{HttpObjectStorage, ObjectStorage},
};

pub use events::{EventBus, MapEvent};

pub use surface::{MapSurface, MarkerHandle};

pub use ui::popup::{PinPopup, PopupManager};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, PinMapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum PinMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Pin store error: {0}")]
    Store(String),

    #[error("Image upload error: {0}")]
    Upload(String),

    #[error("Geocoding error: {0}")]
    Geocode(String),

    #[error("Unknown pin: {0}")]
    UnknownPin(String),
}

/// Error type alias for convenience
pub type Error = PinMapError;
