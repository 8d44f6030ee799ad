//! Compass bearing arithmetic.

/// Signed shortest-path difference between two compass bearings.
///
/// The result lies in `(-180, 180]`. It is positive when `to` is reached by
/// rotating clockwise from `from` along the shorter arc and negative when the
/// shorter arc is counter-clockwise. Antipodal bearings always yield `+180`.
///
/// Inputs may be any finite number of degrees; both are reduced modulo 360.
pub fn signed_angle_difference(from: f64, to: f64) -> f64 {
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    let clockwise = (to - from).rem_euclid(360.0) % 360.0;

    if clockwise > 180.0 {
        clockwise - 360.0
    } else {
        clockwise
    }
}

/// Normalize a bearing into `[0, 360)`.
pub fn normalize_bearing(bearing: f64) -> f64 {
    bearing.rem_euclid(360.0) % 360.0
}
