use serde::{Deserialize, Serialize};

/// The three per-pin engagement counters users can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CounterKind {
    BeenThere,
    WantToGo,
    Saved,
}

impl CounterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::BeenThere => "beenThere",
            CounterKind::WantToGo => "wantToGo",
            CounterKind::Saved => "saved",
        }
    }
}

/// Local per-user toggle state for one pin.
///
/// Only `saved` can be re-derived on load (from saved-list membership); no
/// per-user table backs `been_there` / `want_to_go`, so those start false on
/// every fresh load while their aggregate counters persist in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub been_there: bool,
    pub want_to_go: bool,
    pub saved: bool,
}

impl Engagement {
    /// State for a freshly loaded pin, given saved-list membership
    pub fn from_saved_membership(saved: bool) -> Self {
        Self {
            been_there: false,
            want_to_go: false,
            saved,
        }
    }

    pub fn get(&self, kind: CounterKind) -> bool {
        match kind {
            CounterKind::BeenThere => self.been_there,
            CounterKind::WantToGo => self.want_to_go,
            CounterKind::Saved => self.saved,
        }
    }

    /// Flips the flag for `kind` and returns the counter delta to persist:
    /// +1 when toggled on, -1 when toggled off.
    pub fn toggle(&mut self, kind: CounterKind) -> i32 {
        let flag = match kind {
            CounterKind::BeenThere => &mut self.been_there,
            CounterKind::WantToGo => &mut self.want_to_go,
            CounterKind::Saved => &mut self.saved,
        };
        *flag = !*flag;
        if *flag {
            1
        } else {
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycles() {
        let mut state = Engagement::default();
        assert_eq!(state.toggle(CounterKind::BeenThere), 1);
        assert!(state.been_there);
        assert_eq!(state.toggle(CounterKind::BeenThere), -1);
        assert!(!state.been_there);
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut state = Engagement::default();
        state.toggle(CounterKind::WantToGo);
        assert!(state.want_to_go);
        assert!(!state.been_there);
        assert!(!state.saved);
    }

    #[test]
    fn test_saved_membership_derivation() {
        let state = Engagement::from_saved_membership(true);
        assert!(state.saved);
        assert!(!state.been_there);
        assert!(!state.want_to_go);
    }
}
