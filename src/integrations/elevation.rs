//! Elevation service client for route profiles.
//!
//! Resamples a route polyline at a fixed interval through the Valhalla
//! `/height` endpoint.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Public Valhalla height endpoint.
pub const DEFAULT_HEIGHT_URL: &str = "https://valhalla1.openstreetmap.de/height";

/// Default resample interval in metres.
pub const DEFAULT_SAMPLE_INTERVAL_M: f64 = 100.0;

/// Deadline for one height request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Elevation errors
#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("Elevation request failed: {0}")]
    RequestFailed(String),

    #[error("API returned status {0}")]
    HttpStatus(u16),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Elevation samples taken every `interval` metres along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// Distance between samples in metres
    pub interval: f64,
    /// Elevation of each sample in metres
    pub elevations: Vec<f64>,
}

impl ElevationProfile {
    /// A profile of `samples` points at sea level.
    pub fn flat(interval: f64, samples: usize) -> Self {
        Self {
            interval,
            elevations: vec![0.0; samples],
        }
    }

    /// Profile length in metres.
    pub fn length(&self) -> f64 {
        self.elevations.len().saturating_sub(1) as f64 * self.interval
    }

    /// Index of the sample at `distance` metres from the start.
    pub fn index_at(&self, distance: f64) -> usize {
        if self.interval <= 0.0 || distance <= 0.0 {
            return 0;
        }
        ((distance / self.interval) as usize).min(self.elevations.len().saturating_sub(1))
    }
}

/// Route being navigated and its elevation profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpcomingRoute {
    pub route_polyline: Option<String>,
    pub sampled_elevation_data: Option<ElevationProfile>,
}

/// Trait for elevation providers
pub trait ElevationProvider: Send + Sync {
    /// Fetch a profile for an encoded (precision 5) polyline.
    fn fetch_profile(
        &self,
        encoded_polyline: &str,
        interval: f64,
    ) -> impl std::future::Future<Output = Result<ElevationProfile, ElevationError>> + Send;
}

/// Valhalla `/height` client
#[derive(Debug, Clone)]
pub struct ValhallaElevationProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ValhallaElevationProvider {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_HEIGHT_URL)
    }

    /// Create with custom base URL (for testing or self-hosted)
    pub fn with_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }
}

impl Default for ValhallaElevationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct HeightRequest<'a> {
    range: bool,
    shape_format: &'static str,
    encoded_polyline: &'a str,
    resample_distance: f64,
    height_precision: u8,
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    range_height: Vec<Vec<Option<f64>>>,
}

impl HeightResponse {
    fn into_profile(self, interval: f64) -> Result<ElevationProfile, ElevationError> {
        let elevations = self
            .range_height
            .into_iter()
            .map(|pair| {
                // [distance, height]; height is null outside the DEM
                pair.get(1).copied().ok_or_else(|| {
                    ElevationError::InvalidResponse("range_height entry without height".into())
                })
            })
            .map(|height| height.map(|h| h.unwrap_or(0.0)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ElevationProfile {
            interval,
            elevations,
        })
    }
}

impl ElevationProvider for ValhallaElevationProvider {
    async fn fetch_profile(
        &self,
        encoded_polyline: &str,
        interval: f64,
    ) -> Result<ElevationProfile, ElevationError> {
        let request = HeightRequest {
            range: true,
            shape_format: "polyline5",
            encoded_polyline,
            resample_distance: interval,
            height_precision: 1,
        };

        tracing::debug!("Http request to {}...", self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header("User-Agent", concat!("headwind/", env!("CARGO_PKG_VERSION")))
            .json(&request)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ElevationError::Timeout
                } else {
                    ElevationError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ElevationError::HttpStatus(response.status().as_u16()));
        }

        let body: HeightResponse = response
            .json()
            .await
            .map_err(|e| ElevationError::InvalidResponse(e.to_string()))?;

        let profile = body.into_profile(interval)?;
        tracing::debug!(
            "Parsed elevation data response with {} points",
            profile.elevations.len()
        );

        Ok(profile)
    }
}
