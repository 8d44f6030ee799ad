//! Travel heading and its relation to the wind.
//!
//! Raw GPS bearings are smoothed by the [`aggregator`], then combined with
//! the current wind direction by [`headwind`] into a signed relative angle
//! that every widget consumes.

pub mod aggregator;
pub mod display;
pub mod headwind;

use serde::{Deserialize, Serialize};

pub use aggregator::{aggregate_headings, spawn_heading_tracker, HeadingAggregator, HEADING_WINDOW};
pub use display::{HeadwindDisplay, WindIndicator};
pub use headwind::{headwind_speed, relative_heading, spawn_relative_heading};

/// One raw bearing reading from the location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeadingSample {
    /// Bearing in degrees clockwise from north
    Bearing(f64),
    /// GPS fix or bearing not available
    Unavailable,
}

impl From<Option<f64>> for HeadingSample {
    fn from(bearing: Option<f64>) -> Self {
        match bearing {
            Some(b) if b.is_finite() => HeadingSample::Bearing(b),
            _ => HeadingSample::Unavailable,
        }
    }
}

/// Heading state handed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HeadingResponse {
    /// No GPS bearing available
    NoGps,
    /// Bearing known but no current weather to relate it to
    NoWeatherData,
    /// Heading, or heading relative to the wind, in degrees
    Value(f64),
}

impl HeadingResponse {
    /// The numeric value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            HeadingResponse::Value(v) => Some(*v),
            _ => None,
        }
    }
}
