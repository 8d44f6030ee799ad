//! Key-value store for persisted state.
//!
//! Every key holds one JSON document in its own file. Values are loaded once
//! on open and published through `watch` channels, so readers always observe
//! the last committed value. Writers do not coordinate: the last write to a
//! key wins. A missing or corrupt document is logged and replaced by the
//! key's default.

use super::config::{HeadwindSettings, HeadwindStats, WidgetSettings};
use crate::geo::GpsCoordinate;
use crate::integrations::elevation::UpcomingRoute;
use crate::integrations::weather::WeatherSnapshot;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::watch;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Settings,
    WidgetSettings,
    CurrentWeather,
    Stats,
    LastKnownPosition,
    UpcomingRoute,
}

impl StoreKey {
    /// Key name, also the file stem on disk.
    pub fn name(&self) -> &'static str {
        match self {
            StoreKey::Settings => "settings",
            StoreKey::WidgetSettings => "widgetSettings",
            StoreKey::CurrentWeather => "current",
            StoreKey::Stats => "stats",
            StoreKey::LastKnownPosition => "lastKnownPosition",
            StoreKey::UpcomingRoute => "upcomingRoute",
        }
    }
}

/// Settings, weather, stats and route state shared by all pipelines.
#[derive(Debug)]
pub struct Store {
    dir: Option<PathBuf>,
    /// `None` until the rider saved settings at least once
    settings: watch::Sender<Option<HeadwindSettings>>,
    widget_settings: watch::Sender<WidgetSettings>,
    current_weather: watch::Sender<Option<WeatherSnapshot>>,
    stats: watch::Sender<HeadwindStats>,
    last_known_position: watch::Sender<Option<GpsCoordinate>>,
    upcoming_route: watch::Sender<UpcomingRoute>,
}

impl Store {
    /// Open a store backed by JSON files in `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io(dir.clone(), e))?;

        tracing::info!("Opening store at {}", dir.display());

        Ok(Self {
            settings: watch::Sender::new(load(&dir, StoreKey::Settings)),
            widget_settings: watch::Sender::new(
                load(&dir, StoreKey::WidgetSettings).unwrap_or_default(),
            ),
            current_weather: watch::Sender::new(load(&dir, StoreKey::CurrentWeather)),
            stats: watch::Sender::new(load(&dir, StoreKey::Stats).unwrap_or_default()),
            last_known_position: watch::Sender::new(load(&dir, StoreKey::LastKnownPosition)),
            upcoming_route: watch::Sender::new(
                load(&dir, StoreKey::UpcomingRoute).unwrap_or_default(),
            ),
            dir: Some(dir),
        })
    }

    /// A store that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            settings: watch::Sender::new(None),
            widget_settings: watch::Sender::new(WidgetSettings::default()),
            current_weather: watch::Sender::new(None),
            stats: watch::Sender::new(HeadwindStats::default()),
            last_known_position: watch::Sender::new(None),
            upcoming_route: watch::Sender::new(UpcomingRoute::default()),
        }
    }

    fn persist<T: Serialize>(&self, key: StoreKey, value: &T) -> Result<(), StoreError> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let path = key_path(dir, key);
        let content = serde_json::to_string(value)?;

        // Write-then-rename so a crash never leaves a half-written document
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content).map_err(|e| StoreError::Io(tmp.clone(), e))?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::Io(path.clone(), e))?;

        Ok(())
    }

    /// Saved settings, `None` before the first save.
    pub fn stored_settings(&self) -> Option<HeadwindSettings> {
        *self.settings.borrow()
    }

    pub fn subscribe_settings(&self) -> watch::Receiver<Option<HeadwindSettings>> {
        self.settings.subscribe()
    }

    pub fn save_settings(&self, settings: HeadwindSettings) -> Result<(), StoreError> {
        self.persist(StoreKey::Settings, &settings)?;
        self.settings.send_replace(Some(settings));
        Ok(())
    }

    pub fn widget_settings(&self) -> WidgetSettings {
        *self.widget_settings.borrow()
    }

    pub fn subscribe_widget_settings(&self) -> watch::Receiver<WidgetSettings> {
        self.widget_settings.subscribe()
    }

    pub fn save_widget_settings(&self, settings: WidgetSettings) -> Result<(), StoreError> {
        self.persist(StoreKey::WidgetSettings, &settings)?;
        self.widget_settings.send_replace(settings);
        Ok(())
    }

    /// Current weather if it is still fresh at `now`.
    pub fn current_weather(&self, now: DateTime<Utc>) -> Option<WeatherSnapshot> {
        self.current_weather
            .borrow()
            .as_ref()
            .and_then(|w| w.fresh(now))
            .cloned()
    }

    /// Raw weather channel; consumers must apply the staleness check.
    pub fn subscribe_weather(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.current_weather.subscribe()
    }

    pub fn save_current_weather(&self, snapshot: WeatherSnapshot) -> Result<(), StoreError> {
        self.persist(StoreKey::CurrentWeather, &snapshot)?;
        self.current_weather.send_replace(Some(snapshot));
        Ok(())
    }

    pub fn stats(&self) -> HeadwindStats {
        *self.stats.borrow()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<HeadwindStats> {
        self.stats.subscribe()
    }

    pub fn save_stats(&self, stats: HeadwindStats) -> Result<(), StoreError> {
        self.persist(StoreKey::Stats, &stats)?;
        self.stats.send_replace(stats);
        Ok(())
    }

    pub fn last_known_position(&self) -> Option<GpsCoordinate> {
        *self.last_known_position.borrow()
    }

    pub fn save_last_known_position(&self, position: GpsCoordinate) -> Result<(), StoreError> {
        tracing::info!("Saving last known position: {:?}", position);
        self.persist(StoreKey::LastKnownPosition, &position)?;
        self.last_known_position.send_replace(Some(position));
        Ok(())
    }

    pub fn upcoming_route(&self) -> UpcomingRoute {
        self.upcoming_route.borrow().clone()
    }

    pub fn subscribe_upcoming_route(&self) -> watch::Receiver<UpcomingRoute> {
        self.upcoming_route.subscribe()
    }

    pub fn save_upcoming_route(&self, route: UpcomingRoute) -> Result<(), StoreError> {
        self.persist(StoreKey::UpcomingRoute, &route)?;
        self.upcoming_route.send_replace(route);
        Ok(())
    }
}

fn key_path(dir: &Path, key: StoreKey) -> PathBuf {
    dir.join(format!("{}.json", key.name()))
}

fn load<T: DeserializeOwned>(dir: &Path, key: StoreKey) -> Option<T> {
    let path = key_path(dir, key);

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::error!("Failed to read {}: {}", key.name(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Failed to parse {}, using defaults: {}", key.name(), e);
            None
        }
    }
}
