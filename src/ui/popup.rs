use crate::store::counters::{CounterKind, Engagement};
use crate::store::pins::{Pin, PinSummary};

/// View model for the pin detail popup.
///
/// Holds the summary fields plus a local copy of the engagement counters so
/// the popup can show an optimistic count while the server delta is in
/// flight. The rendering toolkit binds to this and nothing else.
#[derive(Debug, Clone)]
pub struct PinPopup {
    summary: PinSummary,
    engagement: Engagement,
    been_there_count: u32,
    want_to_go_count: u32,
    saved_count: u32,
}

impl PinPopup {
    pub fn for_pin(pin: &Pin, in_saved_list: bool) -> Self {
        Self {
            summary: pin.summary(),
            engagement: Engagement::from_saved_membership(in_saved_list),
            been_there_count: pin.been_there_count,
            want_to_go_count: pin.want_to_go_count,
            saved_count: pin.saved_count,
        }
    }

    /// Fallback for a pin known only by summary (e.g. from the saved list);
    /// counters start at zero until a server value arrives
    pub fn from_summary(summary: PinSummary, in_saved_list: bool) -> Self {
        Self {
            summary,
            engagement: Engagement::from_saved_membership(in_saved_list),
            been_there_count: 0,
            want_to_go_count: 0,
            saved_count: 0,
        }
    }

    pub fn summary(&self) -> &PinSummary {
        &self.summary
    }

    pub fn pin_id(&self) -> &str {
        &self.summary.pin_id
    }

    pub fn engagement(&self) -> Engagement {
        self.engagement
    }

    pub fn counter(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::BeenThere => self.been_there_count,
            CounterKind::WantToGo => self.want_to_go_count,
            CounterKind::Saved => self.saved_count,
        }
    }

    /// Flips one toggle, applies the delta to the local counter copy
    /// (floored at zero), and returns the delta to send to the store
    pub fn toggle(&mut self, kind: CounterKind) -> i32 {
        let delta = self.engagement.toggle(kind);
        let slot = match kind {
            CounterKind::BeenThere => &mut self.been_there_count,
            CounterKind::WantToGo => &mut self.want_to_go_count,
            CounterKind::Saved => &mut self.saved_count,
        };
        *slot = if delta.is_negative() {
            slot.saturating_sub(delta.unsigned_abs())
        } else {
            slot.saturating_add(delta as u32)
        };
        delta
    }

    /// Overwrites a local counter with the authoritative server value
    pub fn set_counter(&mut self, kind: CounterKind, value: u32) {
        match kind {
            CounterKind::BeenThere => self.been_there_count = value,
            CounterKind::WantToGo => self.want_to_go_count = value,
            CounterKind::Saved => self.saved_count = value,
        }
    }

    /// Creation date as shown in the popup header
    pub fn formatted_date(&self) -> String {
        self.summary.created_at.format("%d %b %Y").to_string()
    }
}

/// At most one popup is open at a time; opening a new one replaces it
#[derive(Debug, Default)]
pub struct PopupManager {
    current: Option<PinPopup>,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, popup: PinPopup) {
        self.current = Some(popup);
    }

    pub fn close(&mut self) -> Option<PinPopup> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&PinPopup> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut PinPopup> {
        self.current.as_mut()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use chrono::Utc;

    fn summary(id: &str) -> PinSummary {
        PinSummary {
            pin_id: id.to_string(),
            title: "Gamla Stan".to_string(),
            description: String::new(),
            image_url: None,
            country_name: "Sweden".to_string(),
            created_at: Utc::now(),
            coords: LatLng::new(59.33, 18.07),
        }
    }

    #[test]
    fn test_toggle_moves_local_counter() {
        let mut popup = PinPopup::from_summary(summary("a"), false);
        assert_eq!(popup.toggle(CounterKind::BeenThere), 1);
        assert_eq!(popup.counter(CounterKind::BeenThere), 1);
        assert_eq!(popup.toggle(CounterKind::BeenThere), -1);
        assert_eq!(popup.counter(CounterKind::BeenThere), 0);
    }

    #[test]
    fn test_local_counter_floors_at_zero() {
        let mut popup = PinPopup::from_summary(summary("a"), true);
        // saved toggled off while the local copy never saw the increment
        assert_eq!(popup.toggle(CounterKind::Saved), -1);
        assert_eq!(popup.counter(CounterKind::Saved), 0);
    }

    #[test]
    fn test_saved_membership_presets_toggle() {
        let popup = PinPopup::from_summary(summary("a"), true);
        assert!(popup.engagement().saved);
        assert!(!popup.engagement().been_there);
    }

    #[test]
    fn test_manager_replaces_open_popup() {
        let mut manager = PopupManager::new();
        manager.open(PinPopup::from_summary(summary("a"), false));
        manager.open(PinPopup::from_summary(summary("b"), false));
        assert_eq!(manager.current().map(|p| p.pin_id()), Some("b"));

        assert!(manager.close().is_some());
        assert!(!manager.is_open());
    }
}
