//! Headwind - Wind and Weather Engine for Cycling Head Units
//!
//! Fetches current weather and a short-term forecast for the rider's
//! (rounded) position, smooths the GPS travel heading and relates it to the
//! wind direction, and estimates progress along a navigated route.
//! The embedding host feeds telemetry through [`host::channel`].

pub mod app;
pub mod geo;
pub mod heading;
pub mod host;
pub mod integrations;
pub mod location;
pub mod navigation;
pub mod physics;
pub mod storage;

// Re-export commonly used types
pub use app::HeadwindService;
pub use geo::GpsCoordinate;
pub use heading::{HeadingResponse, HeadwindDisplay};
pub use host::{HostEvent, HostFeed, HostStreams};
pub use storage::{AppConfig, HeadwindSettings, Store};
