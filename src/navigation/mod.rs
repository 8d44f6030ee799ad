//! Navigated route tracking.
//!
//! When the host starts navigating a route, its elevation profile is fetched
//! once and persisted with the route so travel estimates can account for
//! climbs. Failed fetches are retried until they succeed or the route
//! changes.

use crate::geo::polyline::POLYLINE_PRECISION;
use crate::geo::{decode_polyline, route_length_meters};
use crate::host::{NavigationState, RiderProfile};
use crate::integrations::elevation::{
    ElevationError, ElevationProfile, ElevationProvider, UpcomingRoute, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SAMPLE_INTERVAL_M,
};
use crate::physics::{project_hourly_distances, HourlyProjection, TravelTimeEstimator};
use crate::storage::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How a route fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteOutcome {
    Saved,
    Abandoned,
    Shutdown,
}

/// Keeps the persisted [`UpcomingRoute`] in line with the navigation state.
pub struct NavigationTracker<E> {
    provider: E,
    store: Arc<Store>,
    retry_interval: Duration,
    request_timeout: Duration,
    sample_interval: f64,
}

impl<E: ElevationProvider> NavigationTracker<E> {
    pub fn new(provider: E, store: Arc<Store>, retry_interval: Duration) -> Self {
        Self {
            provider,
            store,
            retry_interval,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sample_interval: DEFAULT_SAMPLE_INTERVAL_M,
        }
    }

    /// Deadline for a single profile request.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run until `shutdown` fires or the navigation channel closes.
    pub async fn run(
        self,
        mut navigation: watch::Receiver<NavigationState>,
        mut shutdown: watch::Receiver<()>,
    ) {
        let mut current_route: Option<String> = None;

        loop {
            let state = navigation.borrow_and_update().clone();
            tracing::debug!("Got updated navigation state: {:?}", state);

            match state {
                NavigationState::NavigatingRoute { route_polyline }
                    if current_route.as_deref() != Some(route_polyline.as_str()) =>
                {
                    match self.track_route(&route_polyline, &mut navigation, &mut shutdown).await {
                        RouteOutcome::Saved => current_route = Some(route_polyline),
                        RouteOutcome::Abandoned => {
                            tracing::info!("Route changed before its elevation profile arrived");
                            continue;
                        }
                        RouteOutcome::Shutdown => break,
                    }
                }
                NavigationState::NavigatingRoute { .. } => {}
                NavigationState::Idle => {
                    current_route = None;
                    if self.store.upcoming_route() != UpcomingRoute::default() {
                        if let Err(e) = self.store.save_upcoming_route(UpcomingRoute::default()) {
                            tracing::error!("Failed to write empty upcoming route: {}", e);
                        }
                    }
                }
            }

            tokio::select! {
                changed = navigation.changed() => if changed.is_err() { break },
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("Navigation tracker stopped");
    }

    /// Fetch and persist the profile for `route`.
    ///
    /// Navigation updates that keep the same route do not interrupt the
    /// fetch; a different route or the end of navigation abandons it.
    async fn track_route(
        &self,
        route: &str,
        navigation: &mut watch::Receiver<NavigationState>,
        shutdown: &mut watch::Receiver<()>,
    ) -> RouteOutcome {
        tracing::info!("Fetching elevation profile for new route");

        let fetch = self.fetch_with_retry(route);
        tokio::pin!(fetch);

        loop {
            tokio::select! {
                profile = &mut fetch => {
                    let upcoming = UpcomingRoute {
                        route_polyline: Some(route.to_string()),
                        sampled_elevation_data: Some(profile),
                    };
                    match self.store.save_upcoming_route(upcoming) {
                        Ok(()) => tracing::info!("Saved upcoming route data"),
                        Err(e) => tracing::error!("Failed to write upcoming route: {}", e),
                    }
                    return RouteOutcome::Saved;
                }
                changed = navigation.changed() => {
                    if changed.is_err() {
                        return RouteOutcome::Shutdown;
                    }
                    let same_route = matches!(
                        &*navigation.borrow(),
                        NavigationState::NavigatingRoute { route_polyline } if route_polyline == route
                    );
                    if !same_route {
                        return RouteOutcome::Abandoned;
                    }
                }
                _ = shutdown.changed() => return RouteOutcome::Shutdown,
            }
        }
    }

    async fn fetch_with_retry(&self, route: &str) -> ElevationProfile {
        loop {
            let request = self.provider.fetch_profile(route, self.sample_interval);
            let result = match tokio::time::timeout(self.request_timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(ElevationError::Timeout),
            };

            match result {
                Ok(profile) => return profile,
                Err(e) => {
                    tracing::error!("Failed to request elevation profile: {}", e);
                    tokio::time::sleep(self.retry_interval).await;
                }
            }
        }
    }
}

/// Expected progress along the navigated route for each upcoming full hour.
///
/// The rider's position on the route is the route length minus the
/// remaining distance; without a remaining distance the rider is assumed at
/// the start. Returns `None` when no route is known or it cannot be decoded.
pub fn project_route(
    route: &UpcomingRoute,
    distance_to_destination: Option<f64>,
    profile: &RiderProfile,
    now: DateTime<Utc>,
) -> Option<Vec<HourlyProjection>> {
    let polyline = route.route_polyline.as_deref()?;
    let points = match decode_polyline(polyline, POLYLINE_PRECISION) {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!("Failed to decode route polyline: {}", e);
            return None;
        }
    };

    let length = route_length_meters(&points);
    let remaining = distance_to_destination.unwrap_or(length).clamp(0.0, length);
    let position_on_route = length - remaining;

    tracing::info!("Position on route: {:.0}m", position_on_route);

    let estimator = TravelTimeEstimator::new(f64::from(profile.ftp), f64::from(profile.weight_kg));
    Some(project_hourly_distances(
        &estimator,
        now,
        route.sampled_elevation_data.as_ref(),
        position_on_route,
        remaining,
    ))
}
