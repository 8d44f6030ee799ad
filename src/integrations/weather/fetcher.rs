//! Weather fetch loop.
//!
//! Waits for the rider to accept the setup and for the rounded position to
//! settle, then requests the forecast. Failed requests are retried at a
//! fixed interval forever. Otherwise the loop sleeps until the refresh
//! interval elapses or the position, units or profile change; a body that
//! cannot be parsed is logged and counts as no data for that cycle.

use super::{WeatherError, WeatherProvider, WeatherRequest, WeatherSnapshot};
use crate::geo::GpsCoordinate;
use crate::host::{HostStreams, NavigationState};
use crate::physics::HourlyProjection;
use crate::storage::{HeadwindSettings, Store, TimingSettings, WidgetSettings};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Timing of the fetch loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FetcherConfig {
    /// Deadline for a single request
    pub request_timeout: Duration,
    /// Delay before retrying after a failure
    pub retry_interval: Duration,
    /// Quiet period before a position counts as settled
    pub position_debounce: Duration,
    /// Re-fetch interval while nothing changes
    pub refresh_interval: Duration,
}

impl From<&TimingSettings> for FetcherConfig {
    fn from(timing: &TimingSettings) -> Self {
        Self {
            request_timeout: timing.request_timeout(),
            retry_interval: timing.retry_interval(),
            position_debounce: timing.position_debounce(),
            refresh_interval: timing.refresh_interval(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::from(&TimingSettings::default())
    }
}

/// Result of one fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// New snapshot stored
    Updated(WeatherSnapshot),
    /// Request succeeded but the body could not be parsed
    Unparseable,
    /// Request failed or timed out
    Failed(WeatherError),
}

impl FetchOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, FetchOutcome::Updated(_))
    }

    /// Whether the request itself failed and should be retried.
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Fetches weather for the settled position and keeps the store current.
pub struct WeatherFetcher<P> {
    provider: P,
    store: Arc<Store>,
    host: HostStreams,
    config: FetcherConfig,
}

impl<P: WeatherProvider> WeatherFetcher<P> {
    pub fn new(provider: P, store: Arc<Store>, host: HostStreams, config: FetcherConfig) -> Self {
        Self {
            provider,
            store,
            host,
            config,
        }
    }

    /// Effective settings: saved ones, or first-run defaults for the profile.
    fn settings(&self) -> HeadwindSettings {
        let profile = *self.host.profile.borrow();
        HeadwindSettings::resolve(self.store.stored_settings(), profile.as_ref())
    }

    fn request_for(&self, position: GpsCoordinate) -> WeatherRequest {
        let profile = *self.host.profile.borrow();
        WeatherRequest::new(position, &self.settings(), profile.as_ref())
    }

    /// Make one request and record its outcome.
    ///
    /// A timeout counts as an ordinary failure. Stats are updated on every
    /// attempt; a parsed snapshot is persisted and the widget forecast offset
    /// reset.
    pub async fn attempt(&self, request: &WeatherRequest) -> FetchOutcome {
        tracing::info!(
            "Fetching weather data at {:.3}, {:.3}",
            request.position.lat,
            request.position.lon
        );

        let result =
            match tokio::time::timeout(self.config.request_timeout, self.provider.fetch(request)).await {
                Ok(result) => result,
                Err(_) => Err(WeatherError::Timeout),
            };

        let now = Utc::now();
        let body = match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to fetch weather data: {}", e);
                if let Err(e) = self.store.save_stats(self.store.stats().record_failure(now)) {
                    tracing::warn!("Failed to save stats: {}", e);
                }
                return FetchOutcome::Failed(e);
            }
        };

        if let Err(e) = self
            .store
            .save_stats(self.store.stats().record_success(now, request.position))
        {
            tracing::warn!("Failed to save stats: {}", e);
        }

        let snapshot = match WeatherSnapshot::from_json(&body) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Failed to parse weather response: {}", e);
                return FetchOutcome::Unparseable;
            }
        };

        tracing::info!(
            "Weather data received: wind {} from {}°",
            snapshot.current.wind_speed,
            snapshot.current.wind_direction
        );

        if let Err(e) = self.store.save_current_weather(snapshot.clone()) {
            tracing::warn!("Failed to save weather data: {}", e);
        }
        if let Err(e) = self.store.save_widget_settings(WidgetSettings::default()) {
            tracing::warn!("Failed to reset widget settings: {}", e);
        }

        FetchOutcome::Updated(snapshot)
    }

    /// Run until `shutdown` fires.
    ///
    /// `positions` carries the rounded position; `None` means no fix yet.
    pub async fn run(
        self,
        mut positions: watch::Receiver<Option<GpsCoordinate>>,
        mut shutdown: watch::Receiver<()>,
    ) {
        let mut settings_rx = self.store.subscribe_settings();
        let mut profile_rx = self.host.profile.clone();

        tracing::info!("Weather fetcher started");

        'fetch: loop {
            settings_rx.borrow_and_update();
            while !self.settings().welcome_dialog_accepted {
                tracing::info!("Waiting for the setup to be accepted");
                tokio::select! {
                    changed = settings_rx.changed() => if changed.is_err() { break 'fetch },
                    _ = shutdown.changed() => break 'fetch,
                }
            }

            let Some(position) = self.settled_position(&mut positions, &mut shutdown).await else {
                break;
            };

            self.route_projection();

            let request = self.request_for(position);
            let outcome = self.attempt(&request).await;

            // An unparseable body waits for the next refresh like a success
            if outcome.is_failed() {
                tracing::info!("Retrying in {}s", self.config.retry_interval.as_secs());
                tokio::select! {
                    _ = tokio::time::sleep(self.config.retry_interval) => continue,
                    _ = shutdown.changed() => break,
                }
            }

            let deadline = tokio::time::Instant::now() + self.config.refresh_interval;
            settings_rx.borrow_and_update();
            profile_rx.borrow_and_update();

            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::debug!("Refreshing weather data");
                        break;
                    }
                    changed = positions.changed() => if changed.is_err() { break 'fetch },
                    changed = settings_rx.changed() => if changed.is_err() { break 'fetch },
                    changed = profile_rx.changed() => if changed.is_err() { break 'fetch },
                    _ = shutdown.changed() => break 'fetch,
                }

                let latest = *positions.borrow();
                if let Some(latest) = latest {
                    if requires_refetch(&request, &self.request_for(latest)) {
                        tracing::debug!("Request inputs changed, fetching again");
                        break;
                    }
                }
            }
        }

        tracing::info!("Weather fetcher stopped");
    }

    /// Wait for a fix that stays in place for the debounce period.
    ///
    /// Bearing-only updates do not restart the quiet period. Returns `None`
    /// on shutdown.
    async fn settled_position(
        &self,
        positions: &mut watch::Receiver<Option<GpsCoordinate>>,
        shutdown: &mut watch::Receiver<()>,
    ) -> Option<GpsCoordinate> {
        let mut candidate = *positions.borrow_and_update();
        let mut deadline = tokio::time::Instant::now() + self.config.position_debounce;

        loop {
            let Some(position) = candidate else {
                tokio::select! {
                    changed = positions.changed() => if changed.is_err() { return None },
                    _ = shutdown.changed() => return None,
                }
                candidate = *positions.borrow_and_update();
                deadline = tokio::time::Instant::now() + self.config.position_debounce;
                continue;
            };

            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => return Some(position),
                changed = positions.changed() => if changed.is_err() { return None },
                _ = shutdown.changed() => return None,
            }

            let latest = *positions.borrow_and_update();
            if let Some(latest) = latest {
                if !latest.same_place(&position) {
                    candidate = Some(latest);
                    deadline = tokio::time::Instant::now() + self.config.position_debounce;
                }
            }
        }
    }

    /// Log where on the route the rider is expected to be each full hour.
    ///
    /// Independent of the weather request, so it also runs while the API is
    /// unreachable.
    fn route_projection(&self) -> Option<Vec<HourlyProjection>> {
        if !matches!(*self.host.navigation.borrow(), NavigationState::NavigatingRoute { .. }) {
            return None;
        }

        let profile = (*self.host.profile.borrow()).unwrap_or_default();
        let remaining = *self.host.distance_to_destination.borrow();
        let route = self.store.upcoming_route();

        let projections = crate::navigation::project_route(&route, remaining, &profile, Utc::now())?;

        for projection in &projections {
            tracing::info!(
                "Expected route progress by {}: {:.1} km",
                projection.at.format("%H:%M"),
                projection.distance_m / 1000.0
            );
        }

        Some(projections)
    }
}

/// Whether `next` asks for different data than `previous`.
fn requires_refetch(previous: &WeatherRequest, next: &WeatherRequest) -> bool {
    !previous.position.same_place(&next.position)
        || previous.wind_unit != next.wind_unit
        || previous.precipitation_unit != next.precipitation_unit
        || previous.temperature_unit != next.temperature_unit
}
