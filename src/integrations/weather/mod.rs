//! Weather Integration
//!
//! Current conditions and short-term hourly forecast from Open-Meteo.

pub mod fetcher;
pub mod provider;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export main types
pub use fetcher::{FetchOutcome, FetcherConfig, WeatherFetcher};
pub use provider::{OpenMeteoProvider, WeatherProvider, WeatherRequest};

/// Snapshots older than this are never shown.
pub const STALE_AFTER_HOURS: i64 = 12;

/// Maximum number of hourly forecast rows requested and exposed.
pub const FORECAST_HOURS: usize = 12;

/// Weather-related errors
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Request timed out")]
    Timeout,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned status {0}")]
    HttpStatus(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::InvalidResponse(e.to_string())
    }
}

/// Wind speed unit requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindUnit {
    #[default]
    KilometersPerHour,
    MetersPerSecond,
    MilesPerHour,
    Knots,
}

impl WindUnit {
    /// Query parameter value.
    pub fn id(&self) -> &'static str {
        match self {
            WindUnit::KilometersPerHour => "kmh",
            WindUnit::MetersPerSecond => "ms",
            WindUnit::MilesPerHour => "mph",
            WindUnit::Knots => "kn",
        }
    }

    /// Short label for display next to a value.
    pub fn unit_display(&self) -> &'static str {
        match self {
            WindUnit::KilometersPerHour => "km/h",
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::MilesPerHour => "mph",
            WindUnit::Knots => "kn",
        }
    }
}

/// Precipitation unit requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecipitationUnit {
    #[default]
    Millimeters,
    Inch,
}

impl PrecipitationUnit {
    pub fn id(&self) -> &'static str {
        match self {
            PrecipitationUnit::Millimeters => "mm",
            PrecipitationUnit::Inch => "inch",
        }
    }
}

/// Temperature unit requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn id(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

/// Current conditions block of the forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Observation time, unix seconds
    pub time: i64,
    /// Observation interval in seconds
    pub interval: i32,
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    pub relative_humidity: i32,
    pub precipitation: f64,
    pub cloud_cover: i32,
    pub surface_pressure: f64,
    #[serde(rename = "pressure_msl")]
    pub sealevel_pressure: f64,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: f64,
    /// Direction the wind blows from, degrees
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: f64,
    #[serde(rename = "wind_gusts_10m")]
    pub wind_gusts: f64,
    pub weather_code: i32,
}

/// Hourly forecast as parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: Vec<i64>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Vec<f64>,
    pub precipitation_probability: Vec<i32>,
    pub precipitation: Vec<f64>,
    pub weather_code: Vec<i32>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Vec<f64>,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: Vec<f64>,
    #[serde(rename = "wind_gusts_10m")]
    pub wind_gusts: Vec<f64>,
}

/// One row of the hourly forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastHour {
    pub time: i64,
    pub temperature: f64,
    pub precipitation_probability: i32,
    pub precipitation: f64,
    pub weather_code: i32,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub wind_gusts: f64,
}

impl HourlyForecast {
    /// Iterate forecast rows, at most [`FORECAST_HOURS`].
    ///
    /// Rows stop at the shortest array so a truncated response never panics.
    pub fn hours(&self) -> impl Iterator<Item = ForecastHour> + '_ {
        let len = [
            self.time.len(),
            self.temperature.len(),
            self.precipitation_probability.len(),
            self.precipitation.len(),
            self.weather_code.len(),
            self.wind_speed.len(),
            self.wind_direction.len(),
            self.wind_gusts.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0)
        .min(FORECAST_HOURS);

        (0..len).map(move |i| ForecastHour {
            time: self.time[i],
            temperature: self.temperature[i],
            precipitation_probability: self.precipitation_probability[i],
            precipitation: self.precipitation[i],
            weather_code: self.weather_code[i],
            wind_speed: self.wind_speed[i],
            wind_direction: self.wind_direction[i],
            wind_gusts: self.wind_gusts[i],
        })
    }
}

/// Persisted weather record: current conditions plus optional forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub elevation: f64,
    pub utc_offset_seconds: i32,
    #[serde(rename = "hourly", default)]
    pub forecast: Option<HourlyForecast>,
}

impl WeatherSnapshot {
    /// Parse an API response body, ignoring unknown fields.
    pub fn from_json(body: &str) -> Result<Self, WeatherError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Observation time of the current conditions.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.current.time, 0).single()
    }

    /// Whether the snapshot is older than [`STALE_AFTER_HOURS`] at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.observed_at() {
            Some(observed) => observed < now - chrono::Duration::hours(STALE_AFTER_HOURS),
            None => true,
        }
    }

    /// The snapshot if it is still fresh at `now`.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<&Self> {
        (!self.is_stale(now)).then_some(self)
    }

    /// Forecast rows, empty when the response carried none.
    pub fn forecast_hours(&self) -> Vec<ForecastHour> {
        self.forecast
            .as_ref()
            .map(|f| f.hours().collect())
            .unwrap_or_default()
    }
}

/// Coarse weather category from a WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherInterpretation {
    Clear,
    Cloudy,
    Rainy,
    Snowy,
    Drizzle,
    Thunderstorm,
    Unknown,
}

impl WeatherInterpretation {
    /// Map a WMO code (WW) to a category.
    pub fn from_weather_code(code: i32) -> Self {
        match code {
            0 => WeatherInterpretation::Clear,
            1..=3 => WeatherInterpretation::Cloudy,
            45 | 48 | 61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => WeatherInterpretation::Rainy,
            71 | 73 | 75 | 77 | 85 | 86 => WeatherInterpretation::Snowy,
            51 | 53 | 55 | 56 | 57 => WeatherInterpretation::Drizzle,
            95 | 96 | 99 => WeatherInterpretation::Thunderstorm,
            _ => WeatherInterpretation::Unknown,
        }
    }

    /// Get icon name
    pub fn icon_name(&self) -> &'static str {
        match self {
            WeatherInterpretation::Clear => "sun",
            WeatherInterpretation::Cloudy => "cloud",
            WeatherInterpretation::Rainy => "cloud-rain",
            WeatherInterpretation::Snowy => "cloud-snow",
            WeatherInterpretation::Drizzle => "cloud-drizzle",
            WeatherInterpretation::Thunderstorm => "cloud-lightning",
            WeatherInterpretation::Unknown => "question",
        }
    }
}

/// Cardinal direction for a bearing in degrees.
pub fn wind_cardinal(direction: f64) -> &'static str {
    const CARDINALS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let index = ((crate::geo::angle::normalize_bearing(direction) + 22.5) / 45.0) as usize % 8;
    CARDINALS[index]
}
