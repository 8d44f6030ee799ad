//! Position tracking.
//!
//! Host fixes are snapped to the configured grid before anything else sees
//! them. Tracking starts from the last persisted position so the weather can
//! be fetched before the first fix of a ride arrives.

use crate::geo::GpsCoordinate;
use crate::storage::{HeadwindSettings, Store};
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Stream of the current value of `rx` followed by every change.
///
/// Values published faster than the stream is polled are coalesced to the
/// latest one. The stream ends when the sender is dropped.
pub fn watch_stream<T>(rx: watch::Receiver<T>) -> impl Stream<Item = T>
where
    T: Clone + Send + Sync + 'static,
{
    futures::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let value = rx.borrow_and_update().clone();
        Some((value, (rx, false)))
    })
}

/// Rounding and gap filtering for raw host fixes.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    /// Most recent real fix, kept so a settings change can re-round it
    last_fix: Option<GpsCoordinate>,
}

impl LocationFilter {
    /// Start from a previously known position, if any.
    pub fn new(last_known: Option<GpsCoordinate>) -> Self {
        Self {
            last_fix: last_known,
        }
    }

    /// Whether a real position has been seen.
    pub fn has_fix(&self) -> bool {
        self.last_fix.is_some()
    }

    /// Rounded position for a raw host sample.
    ///
    /// A missing fix is only reported while no position was ever known;
    /// after that it yields `None` so the caller keeps the previous value.
    pub fn apply(&mut self, sample: Option<GpsCoordinate>, km: f64) -> Option<Option<GpsCoordinate>> {
        match sample {
            Some(fix) => {
                self.last_fix = Some(fix);
                Some(Some(fix.round(km)))
            }
            None if self.has_fix() => None,
            None => Some(None),
        }
    }

    /// The last fix re-rounded to a new grid.
    pub fn reround(&self, km: f64) -> Option<GpsCoordinate> {
        self.last_fix.map(|fix| fix.round(km))
    }
}

fn rounding_km(settings: Option<HeadwindSettings>) -> f64 {
    settings.unwrap_or_default().round_location_to.km()
}

/// Publish rounded positions into `output`.
///
/// Combines host fixes with the rounding setting; the output only changes
/// when the rounded value does. Ends when either input closes or `output`
/// has no receivers left.
pub fn spawn_location_tracker(
    mut host_location: watch::Receiver<Option<GpsCoordinate>>,
    mut settings: watch::Receiver<Option<HeadwindSettings>>,
    last_known: Option<GpsCoordinate>,
    output: watch::Sender<Option<GpsCoordinate>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut filter = LocationFilter::new(last_known);
        let mut km = rounding_km(*settings.borrow_and_update());

        if let Some(position) = filter.reround(km) {
            tracing::info!("Starting from last known position {:.3}, {:.3}", position.lat, position.lon);
            publish(&output, Some(position));
        }

        loop {
            let sample = *host_location.borrow_and_update();
            if let Some(position) = filter.apply(sample, km) {
                publish(&output, position);
            }

            tokio::select! {
                changed = host_location.changed() => if changed.is_err() { break },
                changed = settings.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let updated = rounding_km(*settings.borrow_and_update());
                    if updated != km {
                        tracing::info!("Rounding positions to {} km", updated);
                        km = updated;
                        if let Some(position) = filter.reround(km) {
                            publish(&output, Some(position));
                        }
                    }
                }
                _ = output.closed() => break,
            }
        }

        tracing::debug!("Location tracker finished");
    })
}

fn publish(output: &watch::Sender<Option<GpsCoordinate>>, position: Option<GpsCoordinate>) {
    output.send_if_modified(|current| {
        if *current == position {
            return false;
        }
        *current = position;
        true
    });
}

/// Persist the tracked position at most once per `interval`.
pub fn spawn_position_saver(
    mut positions: watch::Receiver<Option<GpsCoordinate>>,
    store: Arc<Store>,
    interval: Duration,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Only fixes seen from here on are saved
        positions.borrow_and_update();

        loop {
            tokio::select! {
                changed = positions.changed() => if changed.is_err() { break },
                _ = shutdown.changed() => break,
            }

            let position = *positions.borrow_and_update();
            let Some(position) = position else {
                continue;
            };
            if store.last_known_position() == Some(position) {
                continue;
            }

            if let Err(e) = store.save_last_known_position(position) {
                tracing::warn!("Failed to save last known position: {}", e);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }
    })
}
