//! What the headwind widget draws.

use super::{headwind_speed, HeadingResponse};
use crate::integrations::weather::WeatherSnapshot;
use crate::storage::{HeadwindSettings, WindDirectionIndicatorSetting, WindDirectionIndicatorTextSetting};
use chrono::{DateTime, Utc};

/// Arrow and label for one frame of the headwind widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WindIndicator {
    /// Arrow rotation in degrees
    pub arrow_bearing: f64,
    /// Text inside the arrow, empty when disabled
    pub label: String,
    /// Wind speed in the configured unit
    pub wind_speed: f64,
}

/// Widget state derived from the relative heading.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadwindDisplay {
    NoGps,
    NoWeatherData,
    Indicator(WindIndicator),
}

impl HeadwindDisplay {
    /// Build the widget state for a relative heading.
    ///
    /// `relative` comes from [`relative_heading`](super::relative_heading);
    /// `weather` supplies the speed and, for the absolute arrow mode, the
    /// direction.
    pub fn compute(
        relative: HeadingResponse,
        weather: Option<&WeatherSnapshot>,
        settings: &HeadwindSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let diff = match relative {
            HeadingResponse::NoGps => return HeadwindDisplay::NoGps,
            HeadingResponse::NoWeatherData => return HeadwindDisplay::NoWeatherData,
            HeadingResponse::Value(diff) => diff,
        };
        let Some(weather) = weather.and_then(|w| w.fresh(now)) else {
            return HeadwindDisplay::NoWeatherData;
        };
        let current = &weather.current;

        let arrow_bearing = match settings.wind_direction_indicator_setting {
            WindDirectionIndicatorSetting::HeadwindDirection => diff,
            WindDirectionIndicatorSetting::WindDirection => current.wind_direction + 180.0,
        };

        let label = match settings.wind_direction_indicator_text_setting {
            WindDirectionIndicatorTextSetting::HeadwindSpeed => {
                format!("{}", headwind_speed(diff, current.wind_speed).round() as i64)
            }
            WindDirectionIndicatorTextSetting::WindSpeed => {
                format!("{}", current.wind_speed.round() as i64)
            }
            WindDirectionIndicatorTextSetting::None => String::new(),
        };

        HeadwindDisplay::Indicator(WindIndicator {
            arrow_bearing,
            label,
            wind_speed: current.wind_speed,
        })
    }

    /// Short text for a data field without an arrow.
    pub fn status_text(&self, settings: &HeadwindSettings) -> String {
        match self {
            HeadwindDisplay::NoGps => "No GPS".to_string(),
            HeadwindDisplay::NoWeatherData => "No weather data".to_string(),
            HeadwindDisplay::Indicator(indicator) if indicator.label.is_empty() => {
                format!("{:.0}°", indicator.arrow_bearing)
            }
            HeadwindDisplay::Indicator(indicator) => {
                format!("{} {}", indicator.label, settings.wind_unit.unit_display())
            }
        }
    }
}
