//! Service wiring.
//!
//! Spawns the location, heading, weather and navigation tasks over a shared
//! [`Store`] and hands out the derived channels to widget consumers.

use crate::geo::GpsCoordinate;
use crate::heading::{spawn_heading_tracker, spawn_relative_heading, HeadingResponse, HeadwindDisplay};
use crate::host::HostStreams;
use crate::integrations::elevation::ElevationProvider;
use crate::integrations::weather::{FetcherConfig, WeatherFetcher, WeatherProvider};
use crate::location::{spawn_location_tracker, spawn_position_saver};
use crate::navigation::NavigationTracker;
use crate::storage::{AppConfig, HeadwindSettings, Store};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Running headwind engine.
pub struct HeadwindService {
    store: Arc<Store>,
    host: HostStreams,
    positions: watch::Receiver<Option<GpsCoordinate>>,
    heading: watch::Receiver<HeadingResponse>,
    relative_heading: watch::Receiver<HeadingResponse>,
    shutdown_tx: watch::Sender<()>,
    /// Loops that stop on the shutdown signal
    workers: Vec<JoinHandle<()>>,
    /// Derived streams that only end when their inputs close
    derived: Vec<JoinHandle<()>>,
}

impl HeadwindService {
    /// Start all pipelines. Must be called inside a tokio runtime.
    pub fn start<W, E>(
        store: Arc<Store>,
        host: HostStreams,
        weather: W,
        elevation: E,
        config: &AppConfig,
    ) -> Self
    where
        W: WeatherProvider + 'static,
        E: ElevationProvider + 'static,
    {
        tracing::info!("Starting headwind service v{}", config.version);

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let (position_tx, positions) = watch::channel(None);
        let (heading_tx, heading) = watch::channel(HeadingResponse::NoGps);
        let (relative_tx, relative_heading) = watch::channel(HeadingResponse::NoGps);

        let derived = vec![
            spawn_location_tracker(
                host.location.clone(),
                store.subscribe_settings(),
                store.last_known_position(),
                position_tx,
            ),
            spawn_relative_heading(heading.clone(), store.subscribe_weather(), relative_tx),
        ];

        let fetcher = WeatherFetcher::new(
            weather,
            store.clone(),
            host.clone(),
            FetcherConfig::from(&config.timing),
        );
        let navigation = NavigationTracker::new(elevation, store.clone(), config.timing.retry_interval());

        let workers = vec![
            spawn_heading_tracker(positions.clone(), heading_tx, shutdown_rx.clone()),
            spawn_position_saver(
                positions.clone(),
                store.clone(),
                config.timing.position_save_interval(),
                shutdown_rx.clone(),
            ),
            tokio::spawn(fetcher.run(positions.clone(), shutdown_rx.clone())),
            tokio::spawn(navigation.run(host.navigation.clone(), shutdown_rx)),
        ];

        Self {
            store,
            host,
            positions,
            heading,
            relative_heading,
            shutdown_tx,
            workers,
            derived,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Rounded position used for weather requests.
    pub fn positions(&self) -> watch::Receiver<Option<GpsCoordinate>> {
        self.positions.clone()
    }

    /// Smoothed travel heading.
    pub fn heading(&self) -> watch::Receiver<HeadingResponse> {
        self.heading.clone()
    }

    /// Heading relative to the wind.
    pub fn relative_heading(&self) -> watch::Receiver<HeadingResponse> {
        self.relative_heading.clone()
    }

    /// Effective settings for the current rider profile.
    pub fn settings(&self) -> HeadwindSettings {
        let profile = *self.host.profile.borrow();
        HeadwindSettings::resolve(self.store.stored_settings(), profile.as_ref())
    }

    /// Current headwind widget state.
    pub fn display(&self) -> HeadwindDisplay {
        let now = Utc::now();
        let relative = *self.relative_heading.borrow();
        HeadwindDisplay::compute(relative, self.store.current_weather(now).as_ref(), &self.settings(), now)
    }

    /// Stop all tasks and wait for the loops to finish.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down headwind service");

        self.shutdown_tx.send(()).ok();
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!("Task failed during shutdown: {}", e);
            }
        }
        for task in self.derived {
            task.abort();
        }
    }
}
