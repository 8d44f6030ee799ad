//! Heading relative to the wind.

use super::HeadingResponse;
use crate::geo::signed_angle_difference;
use crate::integrations::weather::WeatherSnapshot;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How often staleness is re-evaluated when no input changes.
pub const STALENESS_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Relate a smoothed travel heading to the current wind.
///
/// The API reports where the wind blows from; adding 180° gives the direction
/// it blows towards, which is compared with the travel bearing. `0` is a pure
/// tailwind, `±180` a pure headwind. Weather older than the staleness limit
/// at `now` counts as absent.
pub fn relative_heading(
    heading: HeadingResponse,
    weather: Option<&WeatherSnapshot>,
    now: DateTime<Utc>,
) -> HeadingResponse {
    let weather = weather.and_then(|w| w.fresh(now));

    match (heading, weather) {
        (HeadingResponse::Value(bearing), Some(data)) => {
            let wind_bearing = data.current.wind_direction + 180.0;
            let diff = signed_angle_difference(bearing, wind_bearing);

            tracing::debug!("Wind bearing: {} vs {} => {}", bearing, wind_bearing, diff);

            HeadingResponse::Value(diff)
        }
        (HeadingResponse::NoGps, _) => HeadingResponse::NoGps,
        _ => HeadingResponse::NoWeatherData,
    }
}

/// Headwind component of `wind_speed` for a relative heading `diff`.
///
/// Positive values oppose the rider, negative values push.
pub fn headwind_speed(diff: f64, wind_speed: f64) -> f64 {
    (diff + 180.0).to_radians().cos() * wind_speed
}

/// Keep `output` updated with the relative heading.
///
/// Recomputes whenever the heading or the weather changes (combine-latest)
/// and at [`STALENESS_CHECK_INTERVAL`] so an ageing snapshot degrades to
/// [`HeadingResponse::NoWeatherData`]. Ends when either input closes or every
/// output receiver is gone.
pub fn spawn_relative_heading(
    mut heading: watch::Receiver<HeadingResponse>,
    mut weather: watch::Receiver<Option<WeatherSnapshot>>,
    output: watch::Sender<HeadingResponse>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut staleness = tokio::time::interval(STALENESS_CHECK_INTERVAL);
        staleness.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            let value = {
                let heading = *heading.borrow_and_update();
                let weather = weather.borrow_and_update();
                relative_heading(heading, weather.as_ref(), Utc::now())
            };
            output.send_if_modified(|current| {
                let changed = *current != value;
                *current = value;
                changed
            });

            tokio::select! {
                changed = heading.changed() => if changed.is_err() { break },
                changed = weather.changed() => if changed.is_err() { break },
                _ = staleness.tick() => {},
                _ = output.closed() => break,
            }
        }

        tracing::debug!("Relative heading task finished");
    })
}
