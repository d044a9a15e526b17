use crate::prelude::HashMap;
use crate::{
    core::geo::LatLng,
    spatial::clustering::{ClusterPass, Feature},
    store::pins::PinSummary,
    surface::{MapSurface, MarkerHandle},
};
use fxhash::FxHasher;
use std::hash::{Hash, Hasher};

/// What a marker looks like on the surface
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerVisual {
    /// Aggregate marker showing how many pins it stands for
    Cluster { count: usize },
    /// Single-pin marker, color-coded by the pin's country
    Pin { pin_id: String, color: [u8; 3] },
}

/// Fixed palette a country name hashes into, so all pins of one country
/// share a color across sessions
const COUNTRY_PALETTE: [[u8; 3]; 10] = [
    [230, 57, 70],
    [244, 162, 97],
    [233, 196, 106],
    [42, 157, 143],
    [38, 70, 83],
    [108, 117, 125],
    [97, 61, 193],
    [214, 40, 140],
    [0, 119, 182],
    [67, 170, 139],
];

pub fn country_color(country_name: &str) -> [u8; 3] {
    let mut hasher = FxHasher::default();
    country_name.hash(&mut hasher);
    COUNTRY_PALETTE[(hasher.finish() % COUNTRY_PALETTE.len() as u64) as usize]
}

/// What a marker click should do
#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    /// Cluster marker: fly to the centroid at its expansion zoom
    FlyTo { center: LatLng, zoom: f64 },
    /// Single marker: open the pin's detail popup
    ShowPin(PinSummary),
}

enum Rendered {
    Cluster { center: LatLng, expansion_zoom: u8 },
    Pin(PinSummary),
}

/// Synchronizes on-screen markers with the latest clustering pass.
///
/// The one component allowed to mutate the surface's marker layer. Every
/// apply removes all previously added markers and drops their handles before
/// adding the new set, so no stale handle can keep a click handler alive.
pub struct MarkerSync {
    rendered: HashMap<MarkerHandle, Rendered>,
    order: Vec<MarkerHandle>,
    last_applied_seq: u64,
}

impl MarkerSync {
    pub fn new() -> Self {
        Self {
            rendered: HashMap::default(),
            order: Vec::new(),
            last_applied_seq: 0,
        }
    }

    /// Sequence number of the pass currently on screen
    pub fn applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    pub fn marker_count(&self) -> usize {
        self.order.len()
    }

    /// Applies one clustering pass to the surface.
    ///
    /// `seq` is the sequence number stamped when the triggering viewport
    /// event was observed. A pass older than the newest already applied is
    /// discarded untouched — the last-started computation wins, which is how
    /// a slow stale fetch is kept from overwriting a fresher viewport.
    pub fn apply<S: MapSurface>(&mut self, surface: &mut S, seq: u64, pass: &ClusterPass) -> bool {
        if seq < self.last_applied_seq {
            log::debug!(
                "discarding stale cluster pass (seq {seq} < {})",
                self.last_applied_seq
            );
            return false;
        }
        self.last_applied_seq = seq;

        for handle in self.order.drain(..) {
            surface.remove_marker(handle);
        }
        self.rendered.clear();

        for feature in pass.features() {
            let (position, visual, rendered) = match feature {
                Feature::Cluster(c) => (
                    c.centroid,
                    MarkerVisual::Cluster {
                        count: c.member_count,
                    },
                    Rendered::Cluster {
                        center: c.centroid,
                        expansion_zoom: c.expansion_zoom,
                    },
                ),
                Feature::Single(pin) => (
                    pin.coords,
                    MarkerVisual::Pin {
                        pin_id: pin.id.clone(),
                        color: country_color(&pin.country_name),
                    },
                    Rendered::Pin(pin.summary()),
                ),
            };
            let handle = surface.add_marker(position, visual);
            self.order.push(handle);
            self.rendered.insert(handle, rendered);
        }
        true
    }

    /// Resolves a click on one of the currently rendered markers
    pub fn click(&self, handle: MarkerHandle, max_zoom: f64) -> Option<ClickAction> {
        match self.rendered.get(&handle)? {
            Rendered::Cluster {
                center,
                expansion_zoom,
            } => Some(ClickAction::FlyTo {
                center: *center,
                zoom: (*expansion_zoom as f64).min(max_zoom),
            }),
            Rendered::Pin(summary) => Some(ClickAction::ShowPin(summary.clone())),
        }
    }

    /// Removes everything from the surface, e.g. after a failed refresh
    pub fn clear<S: MapSurface>(&mut self, surface: &mut S) {
        for handle in self.order.drain(..) {
            surface.remove_marker(handle);
        }
        self.rendered.clear();
    }
}

impl Default for MarkerSync {
    fn default() -> Self {
        Self::new()
    }
}
