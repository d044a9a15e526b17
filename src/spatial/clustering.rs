use crate::prelude::HashMap;
use crate::{
    core::geo::{LatLng, LatLngBounds, Point},
    store::pins::Pin,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for clustering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Grid cell size in world pixels; points landing in the same cell at a
    /// given zoom merge into one cluster
    pub radius_px: f64,
    /// Zoom level at and above which clustering is disabled entirely
    pub disable_at_zoom: u8,
    /// Maximum zoom the map supports; caps expansion zoom
    pub max_zoom: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_px: 60.0,
            disable_at_zoom: 16,
            max_zoom: 18,
        }
    }
}

/// An ephemeral aggregate of nearby pins, shown as one marker with a count
#[derive(Debug, Clone)]
pub struct ClusterFeature {
    /// Identifier valid only within the pass that produced it
    pub id: u32,
    /// Unprojected mean of the member projections
    pub centroid: LatLng,
    pub member_count: usize,
    /// Smallest zoom at which the members no longer collapse into one cluster
    pub expansion_zoom: u8,
}

/// One renderable unit of a clustering pass
#[derive(Debug, Clone)]
pub enum Feature {
    Cluster(ClusterFeature),
    Single(Pin),
}

/// The output of one clustering invocation.
///
/// Rebuilt from scratch on every viewport change; cluster ids never survive
/// into the next pass, so nothing downstream may cache them.
#[derive(Debug, Clone, Default)]
pub struct ClusterPass {
    pub zoom: u8,
    features: Vec<Feature>,
    leaves: HashMap<u32, Vec<Pin>>,
}

impl ClusterPass {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The member pins of a cluster, by the id assigned in this pass
    pub fn leaves(&self, cluster_id: u32) -> Option<&[Pin]> {
        self.leaves.get(&cluster_id).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total pins represented across all features
    pub fn pin_count(&self) -> usize {
        self.features
            .iter()
            .map(|f| match f {
                Feature::Cluster(c) => c.member_count,
                Feature::Single(_) => 1,
            })
            .sum()
    }
}

/// Grid clusterer over Web Mercator world pixels.
///
/// Cells are `radius_px` wide at the requested zoom. Because projecting at
/// zoom z+1 exactly doubles pixel coordinates, two points separated by a cell
/// boundary at z stay separated at every deeper zoom: increasing zoom can
/// only split clusters, never merge them.
#[derive(Debug, Clone, Default)]
pub struct Clusterer {
    config: ClusterConfig,
}

impl Clusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ClusterConfig) {
        self.config = config;
    }

    /// Clusters the given pins for one (bounds, zoom) viewport.
    ///
    /// Pins with invalid coordinates or outside the bounds are skipped. The
    /// grouping and feature order are deterministic for a fixed input: cells
    /// are emitted in sorted grid order with members in input order.
    pub fn run(&self, pins: &[&Pin], bounds: &LatLngBounds, zoom: u8) -> ClusterPass {
        let zoom = zoom.min(self.config.max_zoom);

        let visible: Vec<(&Pin, Point)> = pins
            .iter()
            .filter(|p| p.coords.is_valid() && bounds.contains(&p.coords))
            .map(|p| (*p, p.coords.project_at(zoom)))
            .collect();

        let mut pass = ClusterPass {
            zoom,
            ..Default::default()
        };

        if visible.is_empty() {
            return pass;
        }

        if zoom >= self.config.disable_at_zoom {
            pass.features = visible
                .into_iter()
                .map(|(pin, _)| Feature::Single(pin.clone()))
                .collect();
            return pass;
        }

        let mut cells: BTreeMap<(i64, i64), Vec<(&Pin, Point)>> = BTreeMap::new();
        for (pin, point) in visible {
            cells
                .entry(self.cell_key(point, 1.0))
                .or_default()
                .push((pin, point));
        }

        let mut next_id = 0u32;
        for members in cells.into_values() {
            if members.len() == 1 {
                pass.features.push(Feature::Single(members[0].0.clone()));
                continue;
            }

            let id = next_id;
            next_id += 1;

            let centroid = Self::centroid(&members, zoom);
            let expansion_zoom = self.expansion_zoom(&members, zoom);
            pass.features.push(Feature::Cluster(ClusterFeature {
                id,
                centroid,
                member_count: members.len(),
                expansion_zoom,
            }));
            pass.leaves
                .insert(id, members.into_iter().map(|(p, _)| p.clone()).collect());
        }

        log::debug!(
            "cluster pass at z{zoom}: {} feature(s) for {} pin(s)",
            pass.len(),
            pass.pin_count()
        );
        pass
    }

    fn cell_key(&self, point: Point, scale: f64) -> (i64, i64) {
        (
            (point.x * scale / self.config.radius_px).floor() as i64,
            (point.y * scale / self.config.radius_px).floor() as i64,
        )
    }

    /// Mean of the member projections, unprojected back to a coordinate
    fn centroid(members: &[(&Pin, Point)], zoom: u8) -> LatLng {
        let n = members.len() as f64;
        let sum = members
            .iter()
            .fold(Point::new(0.0, 0.0), |acc, (_, p)| acc.add(p));
        LatLng::unproject_at(Point::new(sum.x / n, sum.y / n), zoom)
    }

    /// Smallest zoom above `zoom` at which the members spread over more than
    /// one cell. Clustering is disabled from `disable_at_zoom` on, so every
    /// cluster splits there at the latest, identical coordinates included.
    fn expansion_zoom(&self, members: &[(&Pin, Point)], zoom: u8) -> u8 {
        for candidate in (zoom + 1)..=self.config.max_zoom {
            if candidate >= self.config.disable_at_zoom {
                return candidate.min(self.config.max_zoom);
            }
            // Projection at a deeper zoom is a pure doubling per level
            let scale = 2_f64.powi((candidate - zoom) as i32);
            let first = self.cell_key(members[0].1, scale);
            if members
                .iter()
                .skip(1)
                .any(|(_, p)| self.cell_key(*p, scale) != first)
            {
                return candidate;
            }
        }
        self.config.max_zoom
    }
}
