//! End-to-end tests of the headwind service with mock providers.

use super::mock::{MockElevationProvider, MockWeatherProvider};
use headwind::geo::GpsCoordinate;
use headwind::heading::{HeadingResponse, HeadwindDisplay};
use headwind::host::{self, HostEvent, NavigationState};
use headwind::integrations::weather::WeatherSnapshot;
use headwind::storage::{AppConfig, HeadwindSettings, Store};
use headwind::HeadwindService;
use std::sync::Arc;
use std::time::Duration;

fn accepted_store() -> Arc<Store> {
    let store = Arc::new(Store::in_memory());
    store
        .save_settings(HeadwindSettings {
            welcome_dialog_accepted: true,
            ..Default::default()
        })
        .unwrap();
    store
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

/// Riding north with wind from the south is a pure tailwind.
#[tokio::test(start_paused = true)]
async fn test_tailwind_then_headwind() {
    let store = accepted_store();
    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store.clone(),
        streams,
        MockWeatherProvider::responding(180.0, 15.0),
        MockElevationProvider::default(),
        &AppConfig::default(),
    );

    assert_eq!(*service.relative_heading().borrow(), HeadingResponse::NoGps);

    feed.apply(HostEvent::Location {
        lat: 52.52,
        lon: 13.41,
        bearing: Some(0.0),
    });
    advance(10).await;

    assert_eq!(*service.heading().borrow(), HeadingResponse::Value(0.0));
    assert_eq!(*service.relative_heading().borrow(), HeadingResponse::Value(0.0));

    // Wind turns to blow from the north
    let mut snapshot = store.current_weather(chrono::Utc::now()).unwrap();
    snapshot.current.wind_direction = 0.0;
    store.save_current_weather(snapshot).unwrap();
    advance(1).await;

    let diff = service.relative_heading().borrow().value().unwrap();
    assert_eq!(diff.abs(), 180.0);

    let HeadwindDisplay::Indicator(indicator) = service.display() else {
        panic!("expected an indicator");
    };
    assert_eq!(indicator.label, "15");

    service.shutdown().await;
}

/// Without accepted setup there is no weather to relate the heading to.
#[tokio::test(start_paused = true)]
async fn test_heading_without_weather() {
    let store = Arc::new(Store::in_memory());
    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store,
        streams,
        MockWeatherProvider::responding(90.0, 10.0),
        MockElevationProvider::default(),
        &AppConfig::default(),
    );

    feed.push_location(Some(GpsCoordinate::new(48.1, 11.6).with_bearing(90.0)));
    advance(30).await;

    assert_eq!(*service.heading().borrow(), HeadingResponse::Value(90.0));
    assert_eq!(*service.relative_heading().borrow(), HeadingResponse::NoWeatherData);
    assert_eq!(service.display(), HeadwindDisplay::NoWeatherData);

    service.shutdown().await;
}

/// Stale weather stops being used once it ages past the limit.
#[tokio::test(start_paused = true)]
async fn test_stale_weather_is_dropped() {
    let store = Arc::new(Store::in_memory());
    let mut snapshot =
        WeatherSnapshot::from_json(&super::mock::weather_body(180.0, 10.0)).unwrap();
    snapshot.current.time -= 13 * 3600;
    store.save_current_weather(snapshot).unwrap();

    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store,
        streams,
        MockWeatherProvider::responding(180.0, 10.0),
        MockElevationProvider::default(),
        &AppConfig::default(),
    );

    feed.push_location(Some(GpsCoordinate::new(48.1, 11.6).with_bearing(0.0)));
    advance(5).await;

    assert_eq!(*service.relative_heading().borrow(), HeadingResponse::NoWeatherData);

    service.shutdown().await;
}

/// Tracking starts from the last known position and saves new fixes.
#[tokio::test(start_paused = true)]
async fn test_last_known_position() {
    let store = accepted_store();
    let last = GpsCoordinate::new(47.0, 8.0);
    store.save_last_known_position(last).unwrap();

    let weather = MockWeatherProvider::responding(0.0, 5.0);
    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store.clone(),
        streams,
        weather.clone(),
        MockElevationProvider::default(),
        &AppConfig::default(),
    );

    // Weather is fetched for the last known position before any fix
    advance(10).await;
    assert_eq!(*service.positions().borrow(), Some(last.round(2.0)));
    let request = weather.last_request().unwrap();
    assert!(request.position.same_place(&last.round(2.0)));

    let fix = GpsCoordinate::new(47.5, 8.5);
    feed.push_location(Some(fix));
    advance(1).await;

    assert_eq!(store.last_known_position(), Some(fix.round(2.0)));

    service.shutdown().await;
}

/// Starting navigation stores the route with its elevation profile.
#[tokio::test(start_paused = true)]
async fn test_navigation_route_is_stored() {
    let store = accepted_store();
    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store.clone(),
        streams,
        MockWeatherProvider::responding(0.0, 5.0),
        MockElevationProvider::default(),
        &AppConfig::default(),
    );

    feed.set_navigation(NavigationState::NavigatingRoute {
        route_polyline: "_p~iF~ps|U_ulLnnqC_mqNvxq`@".to_string(),
    });
    feed.set_distance_to_destination(Some(700_000.0));
    feed.push_location(Some(GpsCoordinate::new(38.5, -120.2).with_bearing(10.0)));
    advance(10).await;

    let route = store.upcoming_route();
    assert!(route.route_polyline.is_some());
    assert_eq!(route.sampled_elevation_data.unwrap().elevations.len(), 10);
    assert!(store.current_weather(chrono::Utc::now()).is_some());

    service.shutdown().await;
}
