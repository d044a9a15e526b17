use crate::{
    core::geo::{LatLng, LatLngBounds},
    store::pins::Pin,
};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A pin wrapped for R-tree indexing by its (lng, lat) position
#[derive(Debug, Clone)]
pub struct IndexedPin {
    pub pin: Pin,
}

impl IndexedPin {
    fn position(&self) -> [f64; 2] {
        [self.pin.coords.lng, self.pin.coords.lat]
    }
}

impl PartialEq for IndexedPin {
    fn eq(&self, other: &Self) -> bool {
        self.pin.id == other.pin.id
    }
}

impl RTreeObject for IndexedPin {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position())
    }
}

impl PointDistance for IndexedPin {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.position();
        let dx = x - point[0];
        let dy = y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree index over the session's pin set.
///
/// Pins with non-finite or out-of-range coordinates are rejected on insert;
/// the index only ever holds clusterable records.
pub struct PinIndex {
    rtree: RTree<IndexedPin>,
}

impl PinIndex {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Inserts one pin; returns false (and logs) when its coordinates are invalid
    pub fn insert(&mut self, pin: Pin) -> bool {
        if !pin.coords.is_valid() {
            log::warn!(
                "dropping pin {} with invalid coordinates ({}, {})",
                pin.id,
                pin.coords.lat,
                pin.coords.lng
            );
            return false;
        }
        self.rtree.insert(IndexedPin { pin });
        true
    }

    /// Replaces the whole index with a fresh pin set, filtering invalid
    /// coordinates. Returns the number of pins kept.
    pub fn replace_all(&mut self, pins: Vec<Pin>) -> usize {
        let total = pins.len();
        let valid: Vec<IndexedPin> = pins
            .into_iter()
            .filter(|p| p.coords.is_valid())
            .map(|pin| IndexedPin { pin })
            .collect();
        if valid.len() < total {
            log::warn!(
                "dropped {} pin(s) with invalid coordinates",
                total - valid.len()
            );
        }
        let kept = valid.len();
        self.rtree = RTree::bulk_load(valid);
        kept
    }

    /// All pins within the geographic bounds, in stable id order
    pub fn query(&self, bounds: &LatLngBounds) -> Vec<&Pin> {
        let envelope = AABB::from_corners(
            [bounds.south_west.lng, bounds.south_west.lat],
            [bounds.north_east.lng, bounds.north_east.lat],
        );
        let mut pins: Vec<&Pin> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|item| &item.pin)
            .collect();
        // R-tree iteration order is structural; sort so clustering input is
        // reproducible across runs
        pins.sort_by(|a, b| a.id.cmp(&b.id));
        pins
    }

    /// Pins nearest to a coordinate, for tap-near-a-point lookups
    pub fn nearest(&self, at: &LatLng, limit: usize) -> Vec<&Pin> {
        self.rtree
            .nearest_neighbor_iter(&[at.lng, at.lat])
            .take(limit)
            .map(|item| &item.pin)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Pin> {
        self.rtree.iter().map(|item| &item.pin).find(|p| p.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Pin> {
        let found = self.rtree.iter().find(|item| item.pin.id == id).cloned();
        found
            .and_then(|item| self.rtree.remove(&item))
            .map(|item| item.pin)
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl Default for PinIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pin(id: &str, lat: f64, lng: f64) -> Pin {
        Pin {
            id: id.to_string(),
            coords: LatLng::new(lat, lng),
            title: String::new(),
            category: String::new(),
            information: String::new(),
            images: Vec::new(),
            country_name: String::new(),
            city: String::new(),
            created_at: Utc::now(),
            been_there_count: 0,
            want_to_go_count: 0,
            saved_count: 0,
        }
    }

    #[test]
    fn test_query_bounds() {
        let mut index = PinIndex::new();
        index.insert(pin("a", 10.0, 10.0));
        index.insert(pin("b", 20.0, 20.0));
        index.insert(pin("c", -40.0, 100.0));

        let bounds = LatLngBounds::from_coords(5.0, 5.0, 25.0, 25.0);
        let hits = index.query(&bounds);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "b");
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let mut index = PinIndex::new();
        assert!(!index.insert(pin("bad", f64::NAN, 10.0)));
        assert!(index.is_empty());

        let kept = index.replace_all(vec![pin("ok", 10.0, 10.0), pin("bad", f64::NAN, 10.0)]);
        assert_eq!(kept, 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut index = PinIndex::new();
        index.insert(pin("a", 10.0, 10.0));
        assert!(index.remove("a").is_some());
        assert!(index.remove("a").is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_nearest() {
        let mut index = PinIndex::new();
        index.insert(pin("near", 10.0, 10.0));
        index.insert(pin("far", 50.0, 50.0));

        let hits = index.nearest(&LatLng::new(10.1, 10.1), 1);
        assert_eq!(hits[0].id, "near");
    }
}
