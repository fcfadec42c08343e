// SPDX-License-Identifier: MIT

//! Race-Tracker API Server
//!
//! Live GPS race tracking: runners post positions, dashboards follow the
//! race over WebSockets.

use race_tracker::{
    config::Config,
    services::{register_archiver, RaceRegistry},
    store::{MemoryTrackStore, TrackStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Race-Tracker API");

    // Load race and runner roster
    tracing::info!(path = %config.roster_path, "Loading roster");
    let registry =
        Arc::new(RaceRegistry::load_from_file(&config.roster_path).expect("Failed to load roster"));

    let store: Arc<dyn TrackStore> = Arc::new(MemoryTrackStore::new());

    // When a race starts, archive the tracks of races no longer running.
    register_archiver(&registry, store.clone());

    // Build shared state
    let state = AppState::build(config.clone(), registry, store);

    // Build router
    let app = race_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("race_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
