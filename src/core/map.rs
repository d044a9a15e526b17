use crate::{
    core::geo::LatLng,
    events::{EventBus, MapEvent},
    layers::markers::{ClickAction, MarkerSync},
    remote::{
        geocode::{label_or_empty, Geocoder, PlaceLabel},
        storage::ObjectStorage,
    },
    spatial::{clustering::ClusterConfig, clustering::Clusterer, index::PinIndex},
    store::{
        counters::CounterKind,
        pins::{NewPin, Pin, PinFilter, PinStore},
        saved::{KeyValueStorage, SavedPins},
    },
    surface::{MapSurface, MarkerHandle},
    ui::popup::{PinPopup, PopupManager},
    PinMapError, Result,
};

/// Fields the user fills in when dropping a new pin on the map.
///
/// Images are raw payloads; they are uploaded to object storage before the
/// record is inserted, and the record only ever carries their URLs.
#[derive(Debug, Clone, Default)]
pub struct PinDraft {
    pub coords: LatLng,
    pub title: String,
    pub category: String,
    pub information: String,
    /// (bytes, content type) pairs
    pub images: Vec<(Vec<u8>, String)>,
}

/// The engine tying the pieces together: pin store, spatial index,
/// clusterer, marker sync, popup and saved-pins state, all against one
/// [`MapSurface`].
///
/// The surface drives it with `handle_viewport_change` / `handle_marker_click`
/// callbacks; everything else flows out through the surface trait and the
/// event bus.
pub struct PinMap<S: MapSurface, P: PinStore> {
    surface: S,
    store: P,
    geocoder: Option<Box<dyn Geocoder>>,
    object_storage: Option<Box<dyn ObjectStorage>>,
    local_storage: Option<Box<dyn KeyValueStorage + Send>>,
    index: PinIndex,
    clusterer: Clusterer,
    markers: MarkerSync,
    saved: SavedPins,
    popups: PopupManager,
    events: EventBus,
    next_seq: u64,
}

impl<S: MapSurface, P: PinStore> PinMap<S, P> {
    pub fn new(surface: S, store: P) -> Self {
        Self {
            surface,
            store,
            geocoder: None,
            object_storage: None,
            local_storage: None,
            index: PinIndex::new(),
            clusterer: Clusterer::default(),
            markers: MarkerSync::new(),
            saved: SavedPins::new("saved-pins"),
            popups: PopupManager::new(),
            events: EventBus::new(),
            next_seq: 0,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_object_storage(mut self, storage: Box<dyn ObjectStorage>) -> Self {
        self.object_storage = Some(storage);
        self
    }

    /// Attaches key/value storage and loads the saved-pins list from it
    pub fn with_local_storage(mut self, storage: Box<dyn KeyValueStorage + Send>) -> Self {
        self.saved = SavedPins::load(storage.as_ref(), "saved-pins");
        self.local_storage = Some(storage);
        self
    }

    pub fn with_cluster_config(mut self, config: ClusterConfig) -> Self {
        self.clusterer.set_config(config);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn index(&self) -> &PinIndex {
        &self.index
    }

    pub fn saved(&self) -> &SavedPins {
        &self.saved
    }

    pub fn popup(&self) -> Option<&PinPopup> {
        self.popups.current()
    }

    pub fn close_popup(&mut self) {
        self.popups.close();
    }

    pub fn marker_count(&self) -> usize {
        self.markers.marker_count()
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Dispatches queued events to subscribers and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process()
    }

    /// Fetches pins from the store and rebuilds the index and markers.
    ///
    /// A store failure is not fatal: the map degrades to an empty marker set,
    /// logs the error and emits [`MapEvent::StoreUnavailable`].
    pub async fn refresh_pins(&mut self, filter: &PinFilter) {
        let seq = self.stamp_seq();
        match self.store.list_pins(filter).await {
            Ok(pins) => {
                let count = self.index.replace_all(pins);
                self.events.emit(MapEvent::PinsLoaded { count });
                self.apply_current_viewport(seq);
            }
            Err(err) => {
                log::error!("pin fetch failed: {err}");
                self.index.clear();
                self.markers.clear(&mut self.surface);
                self.events
                    .emit(MapEvent::StoreUnavailable { reason: err.to_string() });
            }
        }
    }

    /// Called by the surface whenever pan or zoom settles; reclusters the
    /// visible pins and swaps the marker set
    pub fn handle_viewport_change(&mut self) {
        let bounds = self.surface.bounds();
        let zoom = self.surface.zoom();
        let seq = self.stamp_seq();
        self.apply_current_viewport(seq);
        self.events.emit(MapEvent::ViewportChanged { bounds, zoom });
    }

    /// Routes a marker click: clusters fly the surface to their expansion
    /// zoom, singles open the detail popup.
    ///
    /// The fly-to does not recluster by itself; the surface reports the
    /// settled move through `handle_viewport_change` as with any pan.
    pub fn handle_marker_click(&mut self, handle: MarkerHandle) {
        let max_zoom = self.clusterer.config().max_zoom as f64;
        match self.markers.click(handle, max_zoom) {
            Some(ClickAction::FlyTo { center, zoom }) => {
                self.surface.fly_to(center, zoom);
                self.events.emit(MapEvent::ClusterExpanded { center, zoom });
            }
            Some(ClickAction::ShowPin(summary)) => {
                let pin_id = summary.pin_id.clone();
                let in_saved_list = self.saved.contains(&pin_id);
                let popup = match self.index.get(&pin_id) {
                    Some(pin) => PinPopup::for_pin(pin, in_saved_list),
                    None => PinPopup::from_summary(summary, in_saved_list),
                };
                self.popups.open(popup);
                self.events.emit(MapEvent::PinSelected { pin_id });
            }
            None => {}
        }
    }

    /// Flips one engagement toggle on the open popup and sends the counter
    /// delta to the store.
    ///
    /// The local toggle, counter copy and saved list update immediately; a
    /// failed store write is logged and the optimistic state kept.
    pub async fn toggle_engagement(&mut self, kind: CounterKind) {
        let (delta, pin_id, summary) = match self.popups.current_mut() {
            Some(popup) => {
                let delta = popup.toggle(kind);
                (delta, popup.pin_id().to_string(), popup.summary().clone())
            }
            None => return,
        };

        if kind == CounterKind::Saved {
            if delta > 0 {
                self.saved.save(summary);
            } else {
                self.saved.remove(&pin_id);
            }
            self.persist_saved();
        }

        // Keep the indexed copy in step so a reopened popup shows the
        // adjusted aggregate
        if let Some(mut pin) = self.index.remove(&pin_id) {
            pin.apply_delta(kind, delta);
            self.index.insert(pin);
        }

        match self.store.adjust_counter(&pin_id, kind, delta).await {
            Ok(value) => {
                if let Some(popup) = self.popups.current_mut() {
                    if popup.pin_id() == pin_id {
                        popup.set_counter(kind, value);
                    }
                }
            }
            Err(err) => {
                log::warn!("counter write for pin {pin_id} failed: {err}");
            }
        }
    }

    /// Creates a pin from a user draft: uploads its images, reverse-geocodes
    /// the coordinate and inserts the record.
    ///
    /// Upload and insert failures abort the save; a geocoding failure only
    /// degrades the location labels to empty strings.
    pub async fn create_pin(&mut self, draft: PinDraft) -> Result<Pin> {
        if !draft.coords.is_valid() {
            return Err(PinMapError::InvalidCoordinates(format!(
                "({}, {})",
                draft.coords.lat, draft.coords.lng
            )));
        }

        let mut image_urls = Vec::with_capacity(draft.images.len());
        for (bytes, content_type) in draft.images {
            let storage = self.object_storage.as_deref().ok_or_else(|| {
                PinMapError::Upload("no object storage configured".to_string())
            })?;
            image_urls.push(storage.upload_image(bytes, &content_type).await?);
        }

        let label = match self.geocoder.as_deref() {
            Some(geocoder) => {
                label_or_empty(geocoder, draft.coords.lng, draft.coords.lat).await
            }
            None => PlaceLabel::default(),
        };

        let pin = self
            .store
            .insert_pin(NewPin {
                coords: draft.coords,
                title: draft.title,
                category: draft.category,
                information: draft.information,
                images: image_urls,
                country_name: label.country,
                city: label.city,
            })
            .await?;

        self.index.insert(pin.clone());
        let seq = self.stamp_seq();
        self.apply_current_viewport(seq);
        Ok(pin)
    }

    /// Deletes a pin everywhere: store, index, saved list and popup
    pub async fn delete_pin(&mut self, id: &str) -> Result<()> {
        self.store.delete_pin(id).await?;
        self.index.remove(id);
        if self.saved.remove(id).is_some() {
            self.persist_saved();
        }
        if self.popups.current().map(|p| p.pin_id()) == Some(id) {
            self.popups.close();
        }
        let seq = self.stamp_seq();
        self.apply_current_viewport(seq);
        Ok(())
    }

    fn stamp_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Integer zoom the clusterer runs at for the surface's current view
    fn cluster_zoom(&self) -> u8 {
        let max = self.clusterer.config().max_zoom as f64;
        self.surface.zoom().floor().clamp(0.0, max) as u8
    }

    fn apply_current_viewport(&mut self, seq: u64) {
        let bounds = self.surface.bounds();
        let zoom = self.cluster_zoom();
        let pass = {
            let pins = self.index.query(&bounds);
            self.clusterer.run(&pins, &bounds, zoom)
        };
        self.markers.apply(&mut self.surface, seq, &pass);
    }

    fn persist_saved(&mut self) {
        if let Some(storage) = self.local_storage.as_deref_mut() {
            if let Err(err) = self.saved.persist(storage) {
                log::warn!("failed to persist saved pins: {err}");
            }
        }
    }
}
