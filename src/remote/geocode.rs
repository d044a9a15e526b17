use crate::{PinMapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Location labels for a coordinate, used to annotate manually dropped pins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceLabel {
    pub city: String,
    pub country: String,
    pub label: String,
}

/// Reverse-geocoding seam
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, lng: f64, lat: f64) -> Result<PlaceLabel>;
}

/// Best-effort lookup: any failure degrades to empty fields and a log line.
/// Geocoding never blocks pin creation.
pub async fn label_or_empty(geocoder: &dyn Geocoder, lng: f64, lat: f64) -> PlaceLabel {
    match geocoder.reverse(lng, lat).await {
        Ok(label) => label,
        Err(err) => {
            log::warn!("reverse geocode failed for ({lng}, {lat}): {err}");
            PlaceLabel::default()
        }
    }
}

/// Nominatim-style reverse geocoding client
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for NominatimGeocoder {
    fn default() -> Self {
        Self::new("https://nominatim.openstreetmap.org/reverse")
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, lng: f64, lat: f64) -> Result<PlaceLabel> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(PinMapError::InvalidCoordinates(format!("({lng}, {lat})")));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lon", lng.to_string()),
                ("lat", lat.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: NominatimResponse = response.json().await?;
        let address = body.address.unwrap_or(NominatimAddress {
            city: None,
            town: None,
            village: None,
            country: None,
        });

        Ok(PlaceLabel {
            city: address
                .city
                .or(address.town)
                .or(address.village)
                .unwrap_or_default(),
            country: address.country.unwrap_or_default(),
            label: body.display_name.unwrap_or_default(),
        })
    }
}
