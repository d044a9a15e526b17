//! Prelude module for common pinmap types and traits
//!
//! Re-exports the most commonly used types for easy importing with
//! `use pinmap::prelude::*;`

pub use crate::core::{
    geo::{LatLng, LatLngBounds, Point},
    map::{PinDraft, PinMap},
    viewport::Viewport,
};

pub use crate::spatial::{
    clustering::{ClusterConfig, ClusterFeature, ClusterPass, Clusterer, Feature},
    index::PinIndex,
};

pub use crate::layers::markers::{ClickAction, MarkerSync, MarkerVisual};

pub use crate::store::{
    counters::{CounterKind, Engagement},
    pins::{MemoryPinStore, NewPin, Pin, PinFilter, PinPatch, PinStore, PinSummary, RestPinStore},
    saved::{KeyValueStorage, MemoryStorage, SavedPins},
};

pub use crate::remote::{
    geocode::{Geocoder, NominatimGeocoder, PlaceLabel},
    storage::{HttpObjectStorage, ObjectStorage},
};

pub use crate::events::{EventBus, MapEvent};
pub use crate::surface::{MapSurface, MarkerHandle};
pub use crate::ui::popup::{PinPopup, PopupManager};

pub use crate::{Error as PinMapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
