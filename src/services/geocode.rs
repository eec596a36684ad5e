//! Forward geocoding via the Nominatim (OpenStreetMap) search API.
//! See: https://nominatim.org/release-docs/develop/api/Search/

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A resolved place: the geocoder's display name plus WGS84 coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Client for the Nominatim search endpoint.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl Geocoder {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    /// Resolve free text to the best-matching place.
    ///
    /// Returns `Ok(None)` when the geocoder has no match; transport and
    /// response errors are `AppError::Upstream`.
    pub async fn resolve(&self, query: &str) -> Result<Option<Location>, AppError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("limit", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Geocoding request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Geocoder returned HTTP {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Geocoder JSON parse error: {}", e)))?;

        let Some(place) = places.into_iter().next() else {
            tracing::debug!("No geocoding match for '{}'", query);
            return Ok(None);
        };

        let location = place_to_location(place)?;
        tracing::info!(
            "Geocoded '{}' to {} ({}, {})",
            query,
            location.name,
            location.latitude,
            location.longitude
        );
        Ok(Some(location))
    }
}

fn place_to_location(place: NominatimPlace) -> Result<Location, AppError> {
    let parse = |field: &str, v: &str| {
        v.parse::<f64>()
            .map_err(|e| AppError::Upstream(format!("Geocoder returned invalid {} '{}': {}", field, v, e)))
    };
    Ok(Location {
        latitude: parse("latitude", &place.lat)?,
        longitude: parse("longitude", &place.lon)?,
        name: place.display_name,
    })
}
