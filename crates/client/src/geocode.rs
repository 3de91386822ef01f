//! Nominatim-style reverse geocoder.
//!
//! - **Endpoint**: `GET {base}/reverse?format=jsonv2&lat=..&lon=..`
//! - **Usage policy**: one request per second and an identifying User-Agent.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use serde::Deserialize;
use swingset_core::model::{Coordinates, Place};
use swingset_core::{AppConfig, ProviderError, ReverseGeocoder};

use crate::error::check_status;
use crate::{ClientError, Throttle};

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Spacing between consecutive requests.
    pub min_interval: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: "swingset/0.1".to_string(),
            min_interval: Duration::from_secs(1),
        }
    }
}

impl GeocoderConfig {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.geocoder_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            min_interval: config.geocoder_min_interval(),
        }
    }
}

/// `format=jsonv2` reverse response. Failures arrive as `{"error": ".."}`
/// with a 200 status.
#[derive(Debug, Default, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub state: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
}

impl ReverseResponse {
    pub fn into_place(self) -> Option<Place> {
        if self.error.is_some() {
            return None;
        }
        let address = self.address?;
        let place = Place {
            city: first_present([address.city, address.town, address.village, address.hamlet]),
            region: first_present([address.state, address.province]),
            country: first_present([address.country]),
        };

        if place.city.is_none() && place.region.is_none() && place.country.is_none() { None } else { Some(place) }
    }
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().map(|s| s.trim().to_string()).find(|s| !s.is_empty())
}

/// Reverse geocoder over a Nominatim-compatible HTTP API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    config: GeocoderConfig,
    throttle: Arc<Throttle>,
}

impl NominatimGeocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, ClientError> {
        url::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidQuery(format!("geocoder base URL {}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let throttle = Arc::new(Throttle::new(config.min_interval));

        Ok(Self { http, config, throttle })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(GeocoderConfig::from_config(config))
    }

    /// Resolve one point. `Ok(None)` when the service has no address for it.
    pub async fn reverse(&self, point: Coordinates) -> Result<Option<Place>, ClientError> {
        self.throttle.acquire().await;

        let url = format!("{}/reverse", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(&[("format", "jsonv2".to_string()), ("lat", point.lat.to_string()), ("lon", point.lon.to_string())])
            .send()
            .await?;

        check_status(response.status())?;

        let bytes = response.bytes().await?;
        let parsed: ReverseResponse = serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(parsed.into_place())
    }
}

#[async_trait::async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    /// Points are resolved one at a time to respect the usage policy. A point
    /// that fails resolves to `None`; the call fails only if every point does.
    async fn reverse_geocode(&self, points: &[Coordinates]) -> Result<Vec<Option<Place>>, ProviderError> {
        let mut places = Vec::with_capacity(points.len());
        let mut last_error = None;

        for point in points {
            match self.reverse(*point).await {
                Ok(place) => places.push(place),
                Err(e) => {
                    tracing::warn!(lat = point.lat, lon = point.lon, error = %e, "reverse geocode failed");
                    places.push(None);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if places.iter().all(Option::is_none) => Err(e.into()),
            _ => Ok(places),
        }
    }
}
