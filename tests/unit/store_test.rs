//! Unit tests for the persisted store.

use chrono::{Duration, Utc};
use headwind::geo::GpsCoordinate;
use headwind::integrations::elevation::{ElevationProfile, UpcomingRoute};
use headwind::integrations::weather::WindUnit;
use headwind::storage::{HeadwindSettings, HeadwindStats, Store, WidgetSettings};

/// Corrupt documents are replaced by defaults.
#[test]
fn test_corrupt_documents_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
    std::fs::write(dir.path().join("stats.json"), "[1, 2").unwrap();
    std::fs::write(dir.path().join("widgetSettings.json"), "\"nope\"").unwrap();

    let store = Store::open(dir.path()).unwrap();

    assert!(store.stored_settings().is_none());
    assert_eq!(store.stats(), HeadwindStats::default());
    assert_eq!(store.widget_settings(), WidgetSettings::default());
}

/// Saved values survive reopening the store.
#[test]
fn test_values_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let position = GpsCoordinate::new(47.37, 8.54);
    let route = UpcomingRoute {
        route_polyline: Some("_p~iF~ps|U".to_string()),
        sampled_elevation_data: Some(ElevationProfile::flat(100.0, 3)),
    };

    {
        let store = Store::open(dir.path()).unwrap();
        store
            .save_settings(HeadwindSettings {
                wind_unit: WindUnit::MetersPerSecond,
                welcome_dialog_accepted: true,
                ..Default::default()
            })
            .unwrap();
        store.save_last_known_position(position).unwrap();
        store.save_upcoming_route(route.clone()).unwrap();
        store
            .save_widget_settings(WidgetSettings {
                current_forecast_hour_offset: 4,
            })
            .unwrap();
    }

    let store = Store::open(dir.path()).unwrap();
    let settings = store.stored_settings().unwrap();
    assert_eq!(settings.wind_unit, WindUnit::MetersPerSecond);
    assert!(settings.welcome_dialog_accepted);
    assert_eq!(store.last_known_position(), Some(position));
    assert_eq!(store.upcoming_route(), route);
    assert_eq!(store.widget_settings().current_forecast_hour_offset, 4);
}

/// Settings written by an older version with fewer fields still load.
#[test]
fn test_partial_settings_document() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"windUnit":"KNOTS","welcomeDialogAccepted":true}"#,
    )
    .unwrap();

    let store = Store::open(dir.path()).unwrap();
    let settings = store.stored_settings().unwrap();
    assert_eq!(settings.wind_unit, WindUnit::Knots);
    assert!(settings.show_windspeed_overlay);
}

/// Stats record failures without losing the last success.
#[test]
fn test_stats_updates() {
    let store = Store::in_memory();
    let position = GpsCoordinate::new(1.0, 2.0);
    let success = Utc::now() - Duration::minutes(10);
    let failure = Utc::now();

    store.save_stats(store.stats().record_success(success, position)).unwrap();
    store.save_stats(store.stats().record_failure(failure)).unwrap();

    let stats = store.stats();
    assert_eq!(stats.last_successful_weather_request, Some(success));
    assert_eq!(stats.last_successful_weather_position, Some(position));
    assert_eq!(stats.failed_weather_request, Some(failure));
}
