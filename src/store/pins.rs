use crate::{core::geo::LatLng, store::counters::CounterKind, PinMapError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// A user-submitted geotagged record of a place of interest.
///
/// Owned by the remote store; coordinates are required and immutable in
/// practice after creation. The three counters are aggregate engagement
/// totals, floored at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: String,
    pub coords: LatLng,
    pub title: String,
    pub category: String,
    pub information: String,
    pub images: Vec<String>,
    pub country_name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub been_there_count: u32,
    pub want_to_go_count: u32,
    pub saved_count: u32,
}

impl Pin {
    pub fn counter(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::BeenThere => self.been_there_count,
            CounterKind::WantToGo => self.want_to_go_count,
            CounterKind::Saved => self.saved_count,
        }
    }

    /// Applies a counter delta, flooring at zero. A decrement from stale
    /// state can never drive a counter negative.
    pub fn apply_delta(&mut self, kind: CounterKind, delta: i32) -> u32 {
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
        *slot
    }

    /// The summary fields shown in the detail popup and the saved list
    pub fn summary(&self) -> PinSummary {
        PinSummary {
            pin_id: self.id.clone(),
            title: self.title.clone(),
            description: self.information.clone(),
            image_url: self.images.first().cloned(),
            country_name: self.country_name.clone(),
            created_at: self.created_at,
            coords: self.coords,
        }
    }
}

/// The slice of a pin shown in popups and kept in the saved-pins list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinSummary {
    pub pin_id: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub country_name: String,
    pub created_at: DateTime<Utc>,
    pub coords: LatLng,
}

/// Fields for inserting a new pin; the store assigns id and timestamp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPin {
    pub coords: LatLng,
    pub title: String,
    pub category: String,
    pub information: String,
    pub images: Vec<String>,
    pub country_name: String,
    pub city: String,
}

/// Partial update for an existing pin; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl PinPatch {
    fn apply(&self, pin: &mut Pin) {
        if let Some(title) = &self.title {
            pin.title = title.clone();
        }
        if let Some(category) = &self.category {
            pin.category = category.clone();
        }
        if let Some(information) = &self.information {
            pin.information = information.clone();
        }
        if let Some(images) = &self.images {
            pin.images = images.clone();
        }
        if let Some(country_name) = &self.country_name {
            pin.country_name = country_name.clone();
        }
        if let Some(city) = &self.city {
            pin.city = city.clone();
        }
    }
}

/// Optional filters for listing pins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinFilter {
    pub country_name: Option<String>,
    pub category: Option<String>,
}

impl PinFilter {
    fn matches(&self, pin: &Pin) -> bool {
        self.country_name
            .as_ref()
            .map_or(true, |c| &pin.country_name == c)
            && self.category.as_ref().map_or(true, |c| &pin.category == c)
    }
}

/// Remote table of geotagged records.
///
/// Counter adjustment is a single server-side atomic delta rather than a
/// client-computed read-modify-write, so concurrent toggles from two clients
/// cannot lose updates.
#[async_trait]
pub trait PinStore: Send + Sync {
    async fn list_pins(&self, filter: &PinFilter) -> Result<Vec<Pin>>;

    async fn insert_pin(&self, draft: NewPin) -> Result<Pin>;

    async fn update_pin(&self, id: &str, patch: PinPatch) -> Result<()>;

    async fn delete_pin(&self, id: &str) -> Result<()>;

    /// Adjusts one counter by `delta` (floored at zero) and returns the new value
    async fn adjust_counter(&self, id: &str, kind: CounterKind, delta: i32) -> Result<u32>;
}

/// In-process pin store used by tests and offline sessions
#[derive(Default)]
pub struct MemoryPinStore {
    pins: Mutex<Vec<Pin>>,
    next_id: AtomicU64,
}

impl MemoryPinStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing pins
    pub fn with_pins(pins: Vec<Pin>) -> Self {
        Self {
            pins: Mutex::new(pins),
            next_id: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PinStore for MemoryPinStore {
    async fn list_pins(&self, filter: &PinFilter) -> Result<Vec<Pin>> {
        let pins = self.pins.lock().await;
        Ok(pins.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn insert_pin(&self, draft: NewPin) -> Result<Pin> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pin = Pin {
            id: format!("pin-{id}"),
            coords: draft.coords,
            title: draft.title,
            category: draft.category,
            information: draft.information,
            images: draft.images,
            country_name: draft.country_name,
            city: draft.city,
            created_at: Utc::now(),
            been_there_count: 0,
            want_to_go_count: 0,
            saved_count: 0,
        };
        self.pins.lock().await.push(pin.clone());
        Ok(pin)
    }

    async fn update_pin(&self, id: &str, patch: PinPatch) -> Result<()> {
        let mut pins = self.pins.lock().await;
        let pin = pins
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PinMapError::UnknownPin(id.to_string()))?;
        patch.apply(pin);
        Ok(())
    }

    async fn delete_pin(&self, id: &str) -> Result<()> {
        let mut pins = self.pins.lock().await;
        let before = pins.len();
        pins.retain(|p| p.id != id);
        if pins.len() == before {
            return Err(PinMapError::UnknownPin(id.to_string()));
        }
        Ok(())
    }

    async fn adjust_counter(&self, id: &str, kind: CounterKind, delta: i32) -> Result<u32> {
        let mut pins = self.pins.lock().await;
        let pin = pins
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PinMapError::UnknownPin(id.to_string()))?;
        Ok(pin.apply_delta(kind, delta))
    }
}

/// Configuration for the hosted table API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestStoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl RestStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Pin store backed by the hosted backend's REST table interface
pub struct RestPinStore {
    client: reqwest::Client,
    config: RestStoreConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CounterDelta {
    counter: CounterKind,
    delta: i32,
}

#[derive(Deserialize)]
struct CounterValue {
    value: u32,
}

impl RestPinStore {
    pub fn new(config: RestStoreConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl PinStore for RestPinStore {
    async fn list_pins(&self, filter: &PinFilter) -> Result<Vec<Pin>> {
        let request = self.client.get(self.url("pins")).query(filter);
        let response = self.authorize(request).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn insert_pin(&self, draft: NewPin) -> Result<Pin> {
        let request = self.client.post(self.url("pins")).json(&draft);
        let response = self.authorize(request).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn update_pin(&self, id: &str, patch: PinPatch) -> Result<()> {
        let request = self
            .client
            .patch(self.url(&format!("pins/{id}")))
            .json(&patch);
        self.authorize(request).send().await?.error_for_status()?;
        Ok(())
    }

    async fn delete_pin(&self, id: &str) -> Result<()> {
        let request = self.client.delete(self.url(&format!("pins/{id}")));
        self.authorize(request).send().await?.error_for_status()?;
        Ok(())
    }

    async fn adjust_counter(&self, id: &str, kind: CounterKind, delta: i32) -> Result<u32> {
        let body = CounterDelta {
            counter: kind,
            delta,
        };
        let request = self
            .client
            .post(self.url(&format!("pins/{id}/counters")))
            .json(&body);
        let response = self.authorize(request).send().await?.error_for_status()?;
        let value: CounterValue = response.json().await?;
        Ok(value.value)
    }
}
