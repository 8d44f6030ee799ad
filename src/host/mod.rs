//! Telemetry supplied by the embedding head-unit host.
//!
//! The host pushes location fixes, the rider profile and navigation state
//! into a [`HostFeed`]; the engine reads them through [`HostStreams`].

use crate::geo::GpsCoordinate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Unit system preference reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Metric units (km/h, kg, km, °C)
    #[default]
    Metric,
    /// Imperial units (mph, lbs, miles, °F)
    Imperial,
}

/// Rider profile as configured on the head unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiderProfile {
    /// Functional Threshold Power in watts
    pub ftp: u16,
    /// Weight in kilograms
    pub weight_kg: f32,
    /// Distance and speed units
    pub distance_units: UnitSystem,
    /// Temperature units
    pub temperature_units: UnitSystem,
}

impl Default for RiderProfile {
    fn default() -> Self {
        Self {
            ftp: 200,
            weight_kg: 75.0,
            distance_units: UnitSystem::Metric,
            temperature_units: UnitSystem::Metric,
        }
    }
}

/// Navigation state of the head unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavigationState {
    /// Not following a route
    #[default]
    Idle,
    /// Following a route given as an encoded polyline (precision 5)
    NavigatingRoute { route_polyline: String },
}

/// One telemetry event from the host, as read by the runner binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Location {
        lat: f64,
        lon: f64,
        #[serde(default)]
        bearing: Option<f64>,
    },
    LocationLost,
    Profile(RiderProfile),
    Navigation(NavigationState),
    DistanceToDestination { meters: Option<f64> },
}

/// Sending half, owned by the host integration.
#[derive(Debug)]
pub struct HostFeed {
    location: watch::Sender<Option<GpsCoordinate>>,
    profile: watch::Sender<Option<RiderProfile>>,
    navigation: watch::Sender<NavigationState>,
    distance_to_destination: watch::Sender<Option<f64>>,
}

/// Receiving half, cloned into every pipeline that needs host data.
#[derive(Debug, Clone)]
pub struct HostStreams {
    /// Latest location fix, `None` while there is no fix
    pub location: watch::Receiver<Option<GpsCoordinate>>,
    /// Rider profile, `None` until the host has reported it
    pub profile: watch::Receiver<Option<RiderProfile>>,
    pub navigation: watch::Receiver<NavigationState>,
    /// Remaining distance of the navigated route in metres
    pub distance_to_destination: watch::Receiver<Option<f64>>,
}

/// Create a connected feed/streams pair.
pub fn channel() -> (HostFeed, HostStreams) {
    let (location_tx, location_rx) = watch::channel(None);
    let (profile_tx, profile_rx) = watch::channel(None);
    let (navigation_tx, navigation_rx) = watch::channel(NavigationState::Idle);
    let (distance_tx, distance_rx) = watch::channel(None);

    (
        HostFeed {
            location: location_tx,
            profile: profile_tx,
            navigation: navigation_tx,
            distance_to_destination: distance_tx,
        },
        HostStreams {
            location: location_rx,
            profile: profile_rx,
            navigation: navigation_rx,
            distance_to_destination: distance_rx,
        },
    )
}

impl HostFeed {
    /// Report a location fix, or `None` when GPS is unavailable.
    pub fn push_location(&self, fix: Option<GpsCoordinate>) {
        self.location.send_replace(fix);
    }

    pub fn set_profile(&self, profile: RiderProfile) {
        self.profile.send_replace(Some(profile));
    }

    pub fn set_navigation(&self, state: NavigationState) {
        self.navigation.send_replace(state);
    }

    pub fn set_distance_to_destination(&self, meters: Option<f64>) {
        self.distance_to_destination.send_replace(meters);
    }

    /// Apply a decoded host event.
    pub fn apply(&self, event: HostEvent) {
        match event {
            HostEvent::Location { lat, lon, bearing } => self.push_location(Some(GpsCoordinate {
                lat,
                lon,
                bearing,
            })),
            HostEvent::LocationLost => self.push_location(None),
            HostEvent::Profile(profile) => self.set_profile(profile),
            HostEvent::Navigation(state) => self.set_navigation(state),
            HostEvent::DistanceToDestination { meters } => self.set_distance_to_destination(meters),
        }
    }
}
