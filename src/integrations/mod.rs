//! External Integrations Module
//!
//! HTTP clients for the Open-Meteo forecast API and the Valhalla elevation
//! service.

pub mod elevation;
pub mod weather;

// Re-export main types for convenience
pub use elevation::{
    ElevationError, ElevationProfile, ElevationProvider, UpcomingRoute, ValhallaElevationProvider,
};
pub use weather::{
    FetchOutcome, FetcherConfig, OpenMeteoProvider, WeatherError, WeatherFetcher, WeatherProvider,
    WeatherRequest, WeatherSnapshot,
};
