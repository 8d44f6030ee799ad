//! Coordinates, bearings and route geometry.

pub mod angle;
pub mod polyline;

use serde::{Deserialize, Serialize};

pub use angle::signed_angle_difference;
pub use polyline::{decode_polyline, route_length_meters, PolylineError};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude, used for grid rounding.
const KM_PER_DEGREE: f64 = 111.0;

/// A GPS fix reported by the host location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinate {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Direction of travel in degrees clockwise from north, if known
    #[serde(default)]
    pub bearing: Option<f64>,
}

impl GpsCoordinate {
    /// Create a coordinate without bearing.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            bearing: None,
        }
    }

    /// Attach a bearing to the coordinate.
    pub fn with_bearing(self, bearing: f64) -> Self {
        Self {
            bearing: Some(bearing),
            ..self
        }
    }

    /// Snap latitude and longitude to a grid of `km` kilometres.
    ///
    /// Nearby fixes collapse onto the same grid point so the weather API is
    /// not queried again for every few metres of movement. The bearing is
    /// carried through unchanged.
    pub fn round(&self, km: f64) -> Self {
        Self {
            lat: round_degrees(self.lat, km),
            lon: round_degrees(self.lon, km),
            bearing: self.bearing,
        }
    }

    /// Haversine distance to `other` in kilometres.
    pub fn distance_to(&self, other: &GpsCoordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Whether two fixes denote the same place (closer than one metre).
    pub fn same_place(&self, other: &GpsCoordinate) -> bool {
        self.distance_to(other).abs() < 0.001
    }
}

fn round_degrees(degrees: f64, km: f64) -> f64 {
    let km_from_origin = degrees * KM_PER_DEGREE;
    let rounded = (km_from_origin / km).round() * km;
    rounded / KM_PER_DEGREE
}

/// Grid resolution used to round positions before querying the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundLocationSetting {
    /// 1 km grid
    Km1,
    /// 2 km grid
    #[default]
    Km2,
    /// 5 km grid
    Km5,
}

impl RoundLocationSetting {
    /// Grid size in kilometres.
    pub fn km(&self) -> f64 {
        match self {
            RoundLocationSetting::Km1 => 1.0,
            RoundLocationSetting::Km2 => 2.0,
            RoundLocationSetting::Km5 => 5.0,
        }
    }
}

impl std::fmt::Display for RoundLocationSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} km", self.km())
    }
}
