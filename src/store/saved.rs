use crate::prelude::HashMap;
use crate::{store::pins::PinSummary, Result};

/// Minimal key/value persistence seam, a stand-in for browser local storage
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// In-memory storage backend for tests and headless sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// The user's favorites list: pin summaries keyed by id.
///
/// An explicit, passed-in store object rather than ambient global state.
/// Local to the browser session and not authoritative; the remote store
/// never sees it.
#[derive(Debug)]
pub struct SavedPins {
    entries: HashMap<String, PinSummary>,
    storage_key: String,
}

impl SavedPins {
    pub fn new(storage_key: impl Into<String>) -> Self {
        Self {
            entries: HashMap::default(),
            storage_key: storage_key.into(),
        }
    }

    /// Loads the list from storage. A missing key yields an empty list; a
    /// corrupt entry is logged and treated as empty since the list is a
    /// non-authoritative convenience.
    pub fn load(storage: &dyn KeyValueStorage, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();
        let entries = match storage.get(&storage_key) {
            Some(raw) => match serde_json::from_str::<Vec<PinSummary>>(&raw) {
                Ok(summaries) => summaries
                    .into_iter()
                    .map(|s| (s.pin_id.clone(), s))
                    .collect(),
                Err(err) => {
                    log::warn!("discarding unreadable saved-pins entry: {err}");
                    HashMap::default()
                }
            },
            None => HashMap::default(),
        };
        Self {
            entries,
            storage_key,
        }
    }

    /// Writes the list back to storage as JSON
    pub fn persist(&self, storage: &mut dyn KeyValueStorage) -> Result<()> {
        let mut summaries: Vec<&PinSummary> = self.entries.values().collect();
        summaries.sort_by(|a, b| a.pin_id.cmp(&b.pin_id));
        let raw = serde_json::to_string(&summaries)?;
        storage.set(&self.storage_key, raw);
        Ok(())
    }

    pub fn save(&mut self, summary: PinSummary) {
        self.entries.insert(summary.pin_id.clone(), summary);
    }

    pub fn remove(&mut self, pin_id: &str) -> Option<PinSummary> {
        self.entries.remove(pin_id)
    }

    pub fn contains(&self, pin_id: &str) -> bool {
        self.entries.contains_key(pin_id)
    }

    pub fn get(&self, pin_id: &str) -> Option<&PinSummary> {
        self.entries.get(pin_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinSummary> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
