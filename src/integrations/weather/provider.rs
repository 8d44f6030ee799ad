//! Weather Data Provider
//!
//! Fetches current conditions and the hourly forecast from Open-Meteo.

use super::{PrecipitationUnit, TemperatureUnit, WeatherError, WindUnit, FORECAST_HOURS};
use crate::geo::GpsCoordinate;
use crate::host::{RiderProfile, UnitSystem};
use crate::storage::config::HeadwindSettings;
use std::time::Duration;

/// Default Open-Meteo forecast endpoint.
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const CURRENT_FIELDS: &str = "surface_pressure,pressure_msl,temperature_2m,relative_humidity_2m,precipitation,weather_code,cloud_cover,wind_speed_10m,wind_direction_10m,wind_gusts_10m";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,precipitation,weather_code,wind_speed_10m,wind_direction_10m,wind_gusts_10m";

/// A forecast query for one (rounded) position.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRequest {
    pub position: GpsCoordinate,
    pub wind_unit: WindUnit,
    pub precipitation_unit: PrecipitationUnit,
    pub temperature_unit: TemperatureUnit,
}

impl WeatherRequest {
    /// Resolve request units from user settings and host unit preferences.
    ///
    /// Wind speed follows the settings; precipitation follows the host's
    /// distance unit and temperature its temperature unit. Without a profile
    /// metric units are used.
    pub fn new(
        position: GpsCoordinate,
        settings: &HeadwindSettings,
        profile: Option<&RiderProfile>,
    ) -> Self {
        let precipitation_unit = match profile.map(|p| p.distance_units) {
            Some(UnitSystem::Imperial) => PrecipitationUnit::Inch,
            _ => PrecipitationUnit::Millimeters,
        };
        let temperature_unit = match profile.map(|p| p.temperature_units) {
            Some(UnitSystem::Imperial) => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        };

        Self {
            position,
            wind_unit: settings.wind_unit,
            precipitation_unit,
            temperature_unit,
        }
    }

    /// Build the full request URL against `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}?latitude={}&longitude={}&current={}&hourly={}&timeformat=unixtime&past_hours=0&forecast_days=1&forecast_hours={}&wind_speed_unit={}&precipitation_unit={}&temperature_unit={}",
            base_url,
            self.position.lat,
            self.position.lon,
            CURRENT_FIELDS,
            HOURLY_FIELDS,
            FORECAST_HOURS,
            self.wind_unit.id(),
            self.precipitation_unit.id(),
            self.temperature_unit.id(),
        )
    }
}

/// Trait for weather providers
pub trait WeatherProvider: Send + Sync {
    /// Issue the request and return the raw response body.
    fn fetch(
        &self,
        request: &WeatherRequest,
    ) -> impl std::future::Future<Output = Result<String, WeatherError>> + Send;
}

/// Weather provider backed by the public Open-Meteo API
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    /// Create a provider for the public endpoint
    pub fn new() -> Self {
        Self::with_url(DEFAULT_FORECAST_URL)
    }

    /// Create with custom base URL (for testing or self-hosted)
    pub fn with_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl WeatherProvider for OpenMeteoProvider {
    async fn fetch(&self, request: &WeatherRequest) -> Result<String, WeatherError> {
        let url = request.url(&self.base_url);

        tracing::debug!("Http request to {}", url);

        // The fetch loop applies its own deadline; this one only guards
        // against a connection that never completes.
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WeatherError::Timeout
                } else if e.is_connect() {
                    WeatherError::NetworkError(e.to_string())
                } else {
                    WeatherError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::HttpStatus(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| WeatherError::NetworkError(e.to_string()))
    }
}
