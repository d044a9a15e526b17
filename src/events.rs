use crate::core::geo::{LatLng, LatLngBounds};
use crate::prelude::HashMap;
use std::collections::VecDeque;

/// Events emitted by the engine.
///
/// An explicit subscription surface replaces wiring closures straight into
/// the map SDK, so handlers stay testable without a real map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The visible area or zoom changed
    ViewportChanged { bounds: LatLngBounds, zoom: f64 },
    /// A single-pin marker was clicked and its popup opened
    PinSelected { pin_id: String },
    /// A cluster marker was clicked and the surface told to fly in
    ClusterExpanded { center: LatLng, zoom: f64 },
    /// A fresh pin set was loaded from the store
    PinsLoaded { count: usize },
    /// The store could not be reached; the map renders empty
    StoreUnavailable { reason: String },
}

impl MapEvent {
    /// Subscription key for this event variant
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::ViewportChanged { .. } => "viewport_changed",
            MapEvent::PinSelected { .. } => "pin_selected",
            MapEvent::ClusterExpanded { .. } => "cluster_expanded",
            MapEvent::PinsLoaded { .. } => "pins_loaded",
            MapEvent::StoreUnavailable { .. } => "store_unavailable",
        }
    }
}

type Handler = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Queued event dispatch in emission order
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<&'static str, Vec<Handler>>,
    queue: VecDeque<MapEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event kind (see [`MapEvent::kind`])
    pub fn on<F>(&mut self, kind: &'static str, handler: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Queues an event; handlers run on the next [`EventBus::process`]
    pub fn emit(&mut self, event: MapEvent) {
        self.queue.push_back(event);
    }

    /// Dispatches all queued events in the order they were emitted and
    /// returns them for callers that poll instead of subscribing
    pub fn process(&mut self) -> Vec<MapEvent> {
        let events: Vec<MapEvent> = self.queue.drain(..).collect();
        for event in &events {
            if let Some(handlers) = self.handlers.get(event.kind()) {
                for handler in handlers {
                    handler(event);
                }
            }
        }
        events
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_events_processed_in_emission_order() {
        let mut bus = EventBus::new();
        bus.emit(MapEvent::PinsLoaded { count: 1 });
        bus.emit(MapEvent::PinsLoaded { count: 2 });

        let events = bus.process();
        assert_eq!(
            events,
            vec![
                MapEvent::PinsLoaded { count: 1 },
                MapEvent::PinsLoaded { count: 2 },
            ]
        );
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_handler_receives_matching_kind_only() {
        let mut bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.on("pin_selected", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(MapEvent::PinsLoaded { count: 5 });
        bus.emit(MapEvent::PinSelected {
            pin_id: "a".to_string(),
        });
        bus.process();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
