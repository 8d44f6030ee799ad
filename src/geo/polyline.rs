//! Encoded polyline decoding for navigation routes.
//!
//! Routes arrive from the host as Google encoded polylines with five decimal
//! places of precision.

use super::GpsCoordinate;
use thiserror::Error;

/// Precision used by the host navigation service.
pub const POLYLINE_PRECISION: u32 = 5;

/// Polyline decoding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolylineError {
    #[error("Invalid character {0:?} at byte {1}")]
    InvalidCharacter(char, usize),

    #[error("Polyline ended in the middle of a value")]
    Truncated,
}

/// Decode an encoded polyline into coordinates (without bearings).
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<GpsCoordinate>, PolylineError> {
    let factor = 10_f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat += next_value(bytes, &mut index)?;
        lon += next_value(bytes, &mut index)?;
        points.push(GpsCoordinate::new(lat as f64 / factor, lon as f64 / factor));
    }

    Ok(points)
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated)?;
        if !(63..127).contains(&byte) || shift > 60 {
            return Err(PolylineError::InvalidCharacter(byte as char, *index));
        }
        *index += 1;

        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Total length of a path in metres.
pub fn route_length_meters(points: &[GpsCoordinate]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]) * 1000.0)
        .sum()
}
