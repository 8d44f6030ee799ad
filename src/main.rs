//! Headwind - headless runner
//!
//! Reads host telemetry as newline-delimited JSON events from stdin and logs
//! the heading relative to the wind as it changes.

use anyhow::Context;
use argh::FromArgs;
use headwind::host::{self, HostEvent};
use headwind::integrations::elevation::ValhallaElevationProvider;
use headwind::integrations::weather::OpenMeteoProvider;
use headwind::storage::config;
use headwind::{HeadingResponse, HeadwindService, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(FromArgs)]
/// Headwind engine fed with host events on stdin
struct Args {
    /// path to the configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// accept the setup so weather requests may start
    #[argh(switch)]
    accept_setup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Args = argh::from_env();

    tracing::info!("Starting Headwind v{}", env!("CARGO_PKG_VERSION"));

    let app_config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;

    let store = Arc::new(Store::open(&app_config.data_dir).context("Failed to open store")?);

    if args.accept_setup {
        let settings = headwind::HeadwindSettings {
            welcome_dialog_accepted: true,
            ..store.stored_settings().unwrap_or_default()
        };
        store.save_settings(settings).context("Failed to save settings")?;
    }

    let (feed, streams) = host::channel();
    let service = HeadwindService::start(
        store,
        streams,
        OpenMeteoProvider::with_url(&app_config.endpoints.forecast_url),
        ValhallaElevationProvider::with_url(&app_config.endpoints.elevation_url),
        &app_config,
    );

    let mut relative = service.relative_heading();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    tracing::info!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostEvent>(&line) {
                    Ok(event) => feed.apply(event),
                    Err(e) => tracing::warn!("Ignoring malformed event: {}", e),
                }
            }
            changed = relative.changed() => {
                if changed.is_err() {
                    break;
                }
                let heading = *relative.borrow_and_update();
                match heading {
                    HeadingResponse::Value(diff) => {
                        tracing::info!("Relative heading {:.0}°: {}", diff, service.display().status_text(&service.settings()));
                    }
                    other => tracing::info!("Relative heading: {:?}", other),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down gracefully...");
                break;
            }
        }
    }

    service.shutdown().await;

    Ok(())
}
