//! Ride physics: distance over time along a route.

pub mod travel_time;

use crate::integrations::elevation::ElevationProfile;
use chrono::{DateTime, DurationRound, Utc};

pub use travel_time::TravelTimeEstimator;

/// Upper bound on projected hours, so a stalled estimate cannot loop forever.
const MAX_PROJECTED_HOURS: usize = 48;

/// Projected position on the route at an upcoming full hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyProjection {
    pub at: DateTime<Utc>,
    /// Distance travelled from the current position, in metres
    pub distance_m: f64,
}

/// Distance covered by each upcoming full hour until the rest of the route
/// is covered.
///
/// The elevation walk starts at the sample nearest `position_on_route_m`.
/// The last entry is the first hour by which the rider is expected to have
/// finished.
pub fn project_hourly_distances(
    estimator: &TravelTimeEstimator,
    now: DateTime<Utc>,
    profile: Option<&ElevationProfile>,
    position_on_route_m: f64,
    remaining_m: f64,
) -> Vec<HourlyProjection> {
    let Ok(mut hour) = now.duration_trunc(chrono::Duration::hours(1)) else {
        return Vec::new();
    };
    let start_index = profile.map_or(0, |p| p.index_at(position_on_route_m));

    let mut projections = Vec::new();
    while projections.len() < MAX_PROJECTED_HOURS {
        hour += chrono::Duration::hours(1);
        let secs = (hour - now).num_milliseconds() as f64 / 1000.0;
        let distance_m = estimator.estimate_distance(secs, profile, start_index);

        tracing::debug!("Travel distance to {}: {:.0} meters", hour, distance_m);
        projections.push(HourlyProjection { at: hour, distance_m });

        if distance_m >= remaining_m {
            break;
        }
    }

    projections
}
