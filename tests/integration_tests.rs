//! End-to-end tests driving the engine through the public surface contract:
//! load, cluster, click, expand, popup, save.

use chrono::Utc;
use pinmap::prelude::*;

/// Captures the engine's log output (cluster-pass debug lines, degradation
/// warnings) in test runs; safe to call from every test
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pin(id: &str, lat: f64, lng: f64, title: &str, country: &str) -> Pin {
    Pin {
        id: id.to_string(),
        coords: LatLng::new(lat, lng),
        title: title.to_string(),
        category: "sight".to_string(),
        information: String::new(),
        images: Vec::new(),
        country_name: country.to_string(),
        city: String::new(),
        created_at: Utc::now(),
        been_there_count: 0,
        want_to_go_count: 0,
        saved_count: 0,
    }
}

fn seeded_store() -> MemoryPinStore {
    MemoryPinStore::with_pins(vec![
        pin("gamla-stan", 59.3293, 18.0686, "Gamla Stan", "Sweden"),
        pin("skansen", 59.3326, 18.1049, "Skansen", "Sweden"),
        pin("opera-house", -33.8568, 151.2153, "Opera House", "Australia"),
    ])
}

/// Surface double that tracks live markers with their visuals and follows
/// fly-to requests by snapping zoom and center
struct FakeSurface {
    next_handle: u64,
    markers: Vec<(MarkerHandle, MarkerVisual)>,
    flights: Vec<(LatLng, f64)>,
    zoom: f64,
}

impl FakeSurface {
    fn new(zoom: f64) -> Self {
        Self {
            next_handle: 0,
            markers: Vec::new(),
            flights: Vec::new(),
            zoom,
        }
    }

    fn handle_for_pin(&self, pin_id: &str) -> Option<MarkerHandle> {
        self.markers.iter().find_map(|(handle, visual)| match visual {
            MarkerVisual::Pin { pin_id: id, .. } if id == pin_id => Some(*handle),
            _ => None,
        })
    }

    fn cluster_handles(&self) -> Vec<MarkerHandle> {
        self.markers
            .iter()
            .filter(|(_, visual)| matches!(visual, MarkerVisual::Cluster { .. }))
            .map(|(handle, _)| *handle)
            .collect()
    }
}

impl MapSurface for FakeSurface {
    fn add_marker(&mut self, _position: LatLng, visual: MarkerVisual) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.push((handle, visual));
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.retain(|(h, _)| *h != handle);
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64) {
        self.flights.push((center, zoom));
        self.zoom = zoom;
    }

    fn bounds(&self) -> LatLngBounds {
        LatLngBounds::from_coords(-85.0, -180.0, 85.0, 180.0)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

#[tokio::test]
async fn test_cluster_expand_and_popup_flow() {
    init_logs();
    let mut map = PinMap::new(FakeSurface::new(3.0), seeded_store());
    map.refresh_pins(&PinFilter::default()).await;

    // At a world-level zoom the two Stockholm pins merge into one cluster
    // and the Sydney pin stands alone
    assert_eq!(map.marker_count(), 2);
    let clusters = map.surface().cluster_handles();
    assert_eq!(clusters.len(), 1);

    // Clicking the cluster flies toward its expansion zoom
    map.handle_marker_click(clusters[0]);
    let (_, fly_zoom) = map.surface().flights[0];
    assert!(fly_zoom > 3.0);
    assert!(fly_zoom <= 18.0);

    // The surface reports the settled move; the pair now renders apart
    map.handle_viewport_change();
    assert_eq!(map.marker_count(), 3);
    assert!(map.surface().cluster_handles().is_empty());

    // Clicking a single opens its popup
    let handle = map.surface().handle_for_pin("gamla-stan").unwrap();
    map.handle_marker_click(handle);
    let popup = map.popup().unwrap();
    assert_eq!(popup.summary().title, "Gamla Stan");
    assert_eq!(popup.summary().country_name, "Sweden");

    let events = map.process_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, MapEvent::ClusterExpanded { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        MapEvent::PinSelected { pin_id } if pin_id == "gamla-stan"
    )));
}

#[tokio::test]
async fn test_clustering_disabled_at_high_zoom() {
    init_logs();
    let mut map = PinMap::new(FakeSurface::new(16.0), seeded_store());
    map.refresh_pins(&PinFilter::default()).await;

    // At the disable threshold every pin renders individually, even the
    // near-identical Stockholm pair
    assert_eq!(map.marker_count(), 3);
    assert!(map.surface().cluster_handles().is_empty());
}

#[tokio::test]
async fn test_zooming_in_never_merges_markers() {
    init_logs();
    let mut map = PinMap::new(FakeSurface::new(0.0), seeded_store());
    map.refresh_pins(&PinFilter::default()).await;

    let mut previous = map.marker_count();
    for zoom in 1..=18u8 {
        map.surface_mut().zoom = zoom as f64;
        map.handle_viewport_change();
        let count = map.marker_count();
        assert!(
            count >= previous,
            "marker count dropped from {previous} to {count} at zoom {zoom}"
        );
        previous = count;
    }
    assert_eq!(previous, 3);
}

#[tokio::test]
async fn test_marker_set_is_deterministic() {
    init_logs();
    let mut first = PinMap::new(FakeSurface::new(3.0), seeded_store());
    let mut second = PinMap::new(FakeSurface::new(3.0), seeded_store());
    first.refresh_pins(&PinFilter::default()).await;
    second.refresh_pins(&PinFilter::default()).await;

    for zoom in 0..=18u8 {
        first.surface_mut().zoom = zoom as f64;
        second.surface_mut().zoom = zoom as f64;
        first.handle_viewport_change();
        second.handle_viewport_change();

        let visuals_first: Vec<_> = first
            .surface()
            .markers
            .iter()
            .map(|(_, v)| v.clone())
            .collect();
        let visuals_second: Vec<_> = second
            .surface()
            .markers
            .iter()
            .map(|(_, v)| v.clone())
            .collect();
        assert_eq!(visuals_first, visuals_second, "divergence at zoom {zoom}");
    }
}

#[tokio::test]
async fn test_saved_list_survives_sessions() {
    init_logs();
    // First session saves a pin and persists through the storage seam
    let mut storage = MemoryStorage::new();
    let mut saved = SavedPins::new("saved-pins");
    saved.save(pin("gamla-stan", 59.3293, 18.0686, "Gamla Stan", "Sweden").summary());
    saved.persist(&mut storage).unwrap();

    // Second session loads it back; the popup derives its saved toggle from
    // list membership while been-there starts fresh
    let mut map = PinMap::new(FakeSurface::new(16.0), seeded_store())
        .with_local_storage(Box::new(storage));
    map.refresh_pins(&PinFilter::default()).await;

    let handle = map.surface().handle_for_pin("gamla-stan").unwrap();
    map.handle_marker_click(handle);
    let popup = map.popup().unwrap();
    assert!(popup.engagement().saved);
    assert!(!popup.engagement().been_there);
    assert!(!popup.engagement().want_to_go);
}

#[tokio::test]
async fn test_empty_store_renders_empty_map() {
    init_logs();
    let mut map = PinMap::new(FakeSurface::new(3.0), MemoryPinStore::new());
    map.refresh_pins(&PinFilter::default()).await;

    assert_eq!(map.marker_count(), 0);
    let events = map.process_events();
    assert!(events.contains(&MapEvent::PinsLoaded { count: 0 }));
}

#[tokio::test]
async fn test_created_pin_joins_clustering() {
    init_logs();
    let mut map = PinMap::new(FakeSurface::new(3.0), seeded_store());
    map.refresh_pins(&PinFilter::default()).await;
    assert_eq!(map.marker_count(), 2);

    // A new pin next to the Stockholm pair grows the cluster count
    map.create_pin(PinDraft {
        coords: LatLng::new(59.3275, 18.0675),
        title: "Royal Palace".to_string(),
        ..Default::default()
    })
    .await
    .unwrap();

    assert_eq!(map.index().len(), 4);
    // the cluster marker now represents three pins
    let cluster_visual = map
        .surface()
        .markers
        .iter()
        .find(|(_, v)| matches!(v, MarkerVisual::Cluster { .. }))
        .map(|(_, v)| v.clone());
    assert_eq!(cluster_visual, Some(MarkerVisual::Cluster { count: 3 }));
}

#[tokio::test]
async fn test_country_colors_are_consistent_across_markers() {
    init_logs();
    let store = MemoryPinStore::with_pins(vec![
        pin("a", 10.0, 10.0, "a", "Sweden"),
        pin("b", -30.0, 120.0, "b", "Sweden"),
    ]);
    let mut map = PinMap::new(FakeSurface::new(3.0), store);
    map.refresh_pins(&PinFilter::default()).await;

    let colors: Vec<_> = map
        .surface()
        .markers
        .iter()
        .filter_map(|(_, v)| match v {
            MarkerVisual::Pin { color, .. } => Some(*color),
            _ => None,
        })
        .collect();
    assert_eq!(colors.len(), 2);
    assert_eq!(colors[0], colors[1]);
}
