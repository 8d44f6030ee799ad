//! Integration tests for the weather fetch loop.

use super::mock::{MockResponse, MockWeatherProvider};
use chrono::Utc;
use headwind::geo::GpsCoordinate;
use headwind::host::{self, HostFeed, RiderProfile, UnitSystem};
use headwind::integrations::weather::{FetcherConfig, WeatherFetcher, WindUnit};
use headwind::storage::{HeadwindSettings, Store, WidgetSettings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct Harness {
    store: Arc<Store>,
    provider: MockWeatherProvider,
    feed: HostFeed,
    positions: watch::Sender<Option<GpsCoordinate>>,
    shutdown: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl Harness {
    fn start(provider: MockWeatherProvider, accepted: bool) -> Self {
        let store = Arc::new(Store::in_memory());
        store
            .save_settings(HeadwindSettings {
                welcome_dialog_accepted: accepted,
                ..Default::default()
            })
            .unwrap();

        let (feed, streams) = host::channel();
        let (positions, positions_rx) = watch::channel(Some(GpsCoordinate::new(52.52, 13.41)));
        let (shutdown, shutdown_rx) = watch::channel(());

        let fetcher = WeatherFetcher::new(
            provider.clone(),
            store.clone(),
            streams,
            FetcherConfig::default(),
        );
        let handle = tokio::spawn(fetcher.run(positions_rx, shutdown_rx));

        Self {
            store,
            provider,
            feed,
            positions,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap();
    }
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

/// A permanently failing API is retried at the fixed interval forever.
#[tokio::test(start_paused = true)]
async fn test_permanent_failure_retries_indefinitely() {
    let harness = Harness::start(MockWeatherProvider::new(MockResponse::Fail), true);

    advance(300).await;

    assert!(harness.provider.attempts() >= 4, "only {} attempts", harness.provider.attempts());
    assert!(!harness.handle.is_finished());

    let stats = harness.store.stats();
    assert!(stats.failed_weather_request.is_some());
    assert!(stats.last_successful_weather_request.is_none());
    assert!(harness.store.current_weather(Utc::now()).is_none());

    harness.stop().await;
}

/// Retries are spaced by the retry interval, not fired back to back.
#[tokio::test(start_paused = true)]
async fn test_retry_interval_is_respected() {
    let harness = Harness::start(MockWeatherProvider::new(MockResponse::Fail), true);

    advance(10).await;
    assert_eq!(harness.provider.attempts(), 1);

    advance(50).await;
    assert_eq!(harness.provider.attempts(), 1);

    advance(20).await;
    assert_eq!(harness.provider.attempts(), 2);

    harness.stop().await;
}

/// A request that never answers times out and counts as a failure.
#[tokio::test(start_paused = true)]
async fn test_hanging_request_times_out() {
    let harness = Harness::start(MockWeatherProvider::new(MockResponse::Hang), true);

    advance(30).await;

    assert_eq!(harness.provider.attempts(), 1);
    assert!(harness.store.stats().failed_weather_request.is_some());

    harness.stop().await;
}

/// A successful fetch persists the snapshot and stats and resets the widget.
#[tokio::test(start_paused = true)]
async fn test_success_persists_weather() {
    let harness = Harness::start(MockWeatherProvider::responding(200.0, 12.0), true);
    harness
        .store
        .save_widget_settings(WidgetSettings {
            current_forecast_hour_offset: 3,
        })
        .unwrap();

    advance(10).await;

    assert_eq!(harness.provider.attempts(), 1);
    let weather = harness.store.current_weather(Utc::now()).unwrap();
    assert_eq!(weather.current.wind_direction, 200.0);

    let stats = harness.store.stats();
    assert!(stats.last_successful_weather_request.is_some());
    assert_eq!(
        stats.last_successful_weather_position,
        Some(GpsCoordinate::new(52.52, 13.41))
    );
    assert_eq!(harness.store.widget_settings().current_forecast_hour_offset, 0);

    // Nothing changes: no further requests before the refresh interval
    advance(600).await;
    assert_eq!(harness.provider.attempts(), 1);

    harness.stop().await;
}

/// Moving to another grid point or changing units fetches again; the hourly
/// refresh fetches even when nothing changes.
#[tokio::test(start_paused = true)]
async fn test_refetch_triggers() {
    let harness = Harness::start(MockWeatherProvider::responding(90.0, 8.0), true);

    advance(10).await;
    assert_eq!(harness.provider.attempts(), 1);

    // Bearing-only update at the same place
    harness
        .positions
        .send_replace(Some(GpsCoordinate::new(52.52, 13.41).with_bearing(45.0)));
    advance(10).await;
    assert_eq!(harness.provider.attempts(), 1);

    harness.positions.send_replace(Some(GpsCoordinate::new(52.60, 13.41)));
    advance(10).await;
    assert_eq!(harness.provider.attempts(), 2);
    assert_eq!(harness.provider.last_request().unwrap().position.lat, 52.60);

    harness
        .store
        .save_settings(HeadwindSettings {
            welcome_dialog_accepted: true,
            wind_unit: WindUnit::Knots,
            ..Default::default()
        })
        .unwrap();
    advance(10).await;
    assert_eq!(harness.provider.attempts(), 3);
    assert_eq!(harness.provider.last_request().unwrap().wind_unit, WindUnit::Knots);

    advance(3700).await;
    assert_eq!(harness.provider.attempts(), 4);

    harness.stop().await;
}

/// Nothing is requested until the setup is accepted.
#[tokio::test(start_paused = true)]
async fn test_waits_for_setup() {
    let harness = Harness::start(MockWeatherProvider::responding(0.0, 5.0), false);

    advance(120).await;
    assert_eq!(harness.provider.attempts(), 0);

    harness
        .store
        .save_settings(HeadwindSettings {
            welcome_dialog_accepted: true,
            ..Default::default()
        })
        .unwrap();
    advance(10).await;
    assert_eq!(harness.provider.attempts(), 1);

    harness.stop().await;
}

/// Request units follow the host profile.
#[tokio::test(start_paused = true)]
async fn test_profile_units_in_request() {
    let harness = Harness::start(MockWeatherProvider::responding(0.0, 5.0), true);
    harness.feed.set_profile(RiderProfile {
        temperature_units: UnitSystem::Imperial,
        ..Default::default()
    });

    advance(10).await;

    let request = harness.provider.last_request().unwrap();
    assert_eq!(
        request.temperature_unit,
        headwind::integrations::weather::TemperatureUnit::Fahrenheit
    );

    harness.stop().await;
}

/// An unparseable body counts as no data until the next refresh or input change.
#[tokio::test(start_paused = true)]
async fn test_unparseable_body_is_no_data() {
    let provider = MockWeatherProvider::new(MockResponse::Body("{\"error\":true}".into()));
    let harness = Harness::start(provider, true);

    advance(10).await;
    assert_eq!(harness.provider.attempts(), 1);
    assert!(harness.store.current_weather(Utc::now()).is_none());
    assert!(harness.store.stats().last_successful_weather_request.is_some());

    // No retry while the position holds still
    advance(3500).await;
    assert_eq!(harness.provider.attempts(), 1);

    harness
        .provider
        .set_response(MockResponse::Body(super::mock::weather_body(10.0, 3.0)));
    harness
        .positions
        .send_replace(Some(GpsCoordinate::new(48.14, 11.58)));
    advance(10).await;
    assert_eq!(harness.provider.attempts(), 2);
    assert!(harness.store.current_weather(Utc::now()).is_some());

    harness.stop().await;
}

/// An unparseable body is requested again after the refresh interval.
#[tokio::test(start_paused = true)]
async fn test_unparseable_body_refreshes_hourly() {
    let provider = MockWeatherProvider::new(MockResponse::Body("not json".into()));
    let harness = Harness::start(provider, true);

    advance(3590).await;
    assert_eq!(harness.provider.attempts(), 1);

    advance(30).await;
    assert_eq!(harness.provider.attempts(), 2);

    harness.stop().await;
}
