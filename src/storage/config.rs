//! User settings, diagnostics and application configuration.
//!
//! Settings, widget state and stats are persisted as JSON blobs by the
//! [`Store`](super::store::Store); the application configuration is a TOML
//! file in the platform data directory.

use crate::geo::{GpsCoordinate, RoundLocationSetting};
use crate::host::{RiderProfile, UnitSystem};
use crate::integrations::weather::{PrecipitationUnit, WindUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What the headwind arrow points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindDirectionIndicatorSetting {
    /// Wind direction relative to the direction of travel
    #[default]
    HeadwindDirection,
    /// Absolute direction the wind blows towards
    WindDirection,
}

/// Text shown inside the headwind arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindDirectionIndicatorTextSetting {
    /// Signed headwind component
    #[default]
    HeadwindSpeed,
    /// Absolute wind speed
    WindSpeed,
    None,
}

/// User-editable settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadwindSettings {
    pub wind_unit: WindUnit,
    pub precipitation_unit: PrecipitationUnit,
    /// Weather requests are only made once the rider accepted the setup
    pub welcome_dialog_accepted: bool,
    pub show_windspeed_overlay: bool,
    pub round_location_to: RoundLocationSetting,
    pub wind_direction_indicator_setting: WindDirectionIndicatorSetting,
    pub wind_direction_indicator_text_setting: WindDirectionIndicatorTextSetting,
}

impl Default for HeadwindSettings {
    fn default() -> Self {
        Self {
            wind_unit: WindUnit::KilometersPerHour,
            precipitation_unit: PrecipitationUnit::Millimeters,
            welcome_dialog_accepted: false,
            show_windspeed_overlay: true,
            round_location_to: RoundLocationSetting::Km2,
            wind_direction_indicator_setting: WindDirectionIndicatorSetting::HeadwindDirection,
            wind_direction_indicator_text_setting: WindDirectionIndicatorTextSetting::HeadwindSpeed,
        }
    }
}

impl HeadwindSettings {
    /// First-run defaults derived from the host's unit preferences.
    pub fn defaults_for(profile: Option<&RiderProfile>) -> Self {
        let metric = profile
            .map(|p| p.distance_units == UnitSystem::Metric)
            .unwrap_or(true);

        Self {
            wind_unit: if metric {
                WindUnit::KilometersPerHour
            } else {
                WindUnit::MilesPerHour
            },
            precipitation_unit: if metric {
                PrecipitationUnit::Millimeters
            } else {
                PrecipitationUnit::Inch
            },
            ..Default::default()
        }
    }

    /// Persisted settings, or first-run defaults when nothing was saved.
    pub fn resolve(stored: Option<Self>, profile: Option<&RiderProfile>) -> Self {
        stored.unwrap_or_else(|| Self::defaults_for(profile))
    }
}

/// Per-widget display state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetSettings {
    /// First forecast hour shown by the forecast strip
    pub current_forecast_hour_offset: i32,
}

/// Weather request diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadwindStats {
    pub last_successful_weather_request: Option<DateTime<Utc>>,
    pub last_successful_weather_position: Option<GpsCoordinate>,
    pub failed_weather_request: Option<DateTime<Utc>>,
}

impl HeadwindStats {
    /// Record a successful request at `position`.
    pub fn record_success(self, at: DateTime<Utc>, position: GpsCoordinate) -> Self {
        Self {
            last_successful_weather_request: Some(at),
            last_successful_weather_position: Some(position),
            ..self
        }
    }

    /// Record a failed request.
    pub fn record_failure(self, at: DateTime<Utc>) -> Self {
        Self {
            failed_weather_request: Some(at),
            ..self
        }
    }

    /// Human-readable status line for the settings screen.
    pub fn summary(&self, current_position: Option<&GpsCoordinate>) -> String {
        let distance = match (current_position, self.last_successful_weather_position.as_ref()) {
            (Some(current), Some(last)) => {
                format!(" ({} km away)", last.distance_to(current).round() as i64)
            }
            _ => String::new(),
        };

        match (self.failed_weather_request, self.last_successful_weather_request) {
            (Some(failed), success) if success.map_or(true, |s| failed > s) => {
                let last_data = success
                    .map(|s| format!(" Last data received at {}{}.", s.format("%H:%M"), distance))
                    .unwrap_or_default();
                format!("Failed to update weather data at {}.{}", failed.format("%H:%M"), last_data)
            }
            (_, Some(success)) => {
                format!("Last weather data received at {}{}", success.format("%H:%M"), distance)
            }
            _ => "No weather data received yet, waiting for GPS fix...".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// External API endpoints
    pub endpoints: EndpointSettings,
    /// Pipeline timing
    pub timing: TimingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            endpoints: EndpointSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

/// External API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Open-Meteo forecast endpoint
    pub forecast_url: String,
    /// Valhalla height endpoint
    pub elevation_url: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            forecast_url: crate::integrations::weather::provider::DEFAULT_FORECAST_URL.to_string(),
            elevation_url: crate::integrations::elevation::DEFAULT_HEIGHT_URL.to_string(),
        }
    }
}

/// Timing of the fetch, retry and tracking loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Weather request deadline in seconds
    pub request_timeout_secs: u64,
    /// Delay before retrying a failed request in seconds
    pub retry_interval_secs: u64,
    /// Quiet period before a position counts as settled, in seconds
    pub position_debounce_secs: u64,
    /// Re-fetch interval while the position does not change, in seconds
    pub refresh_interval_secs: u64,
    /// Minimum interval between last-known-position writes, in seconds
    pub position_save_interval_secs: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 20,
            retry_interval_secs: 60,
            position_debounce_secs: 5,
            refresh_interval_secs: 60 * 60,
            position_save_interval_secs: 60,
        }
    }
}

impl TimingSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn position_debounce(&self) -> Duration {
        Duration::from_secs(self.position_debounce_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn position_save_interval(&self) -> Duration {
        Duration::from_secs(self.position_save_interval_secs)
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("de", "headwind", "Headwind")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from `path`, falling back to defaults
/// when the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(config);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = get_data_dir();

    Ok(config)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
