// SPDX-License-Identifier: MIT

//! Race-Tracker: live GPS race tracking backend
//!
//! Ingests GPS fixes from runners, maintains incremental per-runner metrics
//! (distance, pace, speed), ranks each race's leaderboard, and fans updates
//! out to dashboard viewers over WebSockets.

pub mod config;
pub mod error;
pub mod geo;
pub mod hub;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use hub::BroadcastHub;
use services::{
    IngestionService, LeaderboardEngine, MetricsEngine, RaceRegistry, SnapshotService,
};
use std::sync::Arc;
use store::TrackStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub registry: Arc<RaceRegistry>,
    pub store: Arc<dyn TrackStore>,
    pub metrics: Arc<MetricsEngine>,
    pub snapshots: Arc<SnapshotService>,
    pub hub: Arc<BroadcastHub>,
    pub ingestion: IngestionService,
}

impl AppState {
    /// Wire the full pipeline from a config, roster and store.
    pub fn build(
        config: Config,
        registry: Arc<RaceRegistry>,
        store: Arc<dyn TrackStore>,
    ) -> Arc<Self> {
        let metrics = Arc::new(MetricsEngine::new(config.jitter_threshold_m));
        let leaderboard = Arc::new(LeaderboardEngine::new(metrics.clone(), registry.clone()));
        let snapshots = Arc::new(SnapshotService::new(
            store.clone(),
            metrics.clone(),
            leaderboard.clone(),
            registry.clone(),
        ));
        let hub = Arc::new(BroadcastHub::new(
            snapshots.clone(),
            config.heartbeat_interval,
            config.send_timeout,
        ));
        let ingestion = IngestionService::new(
            registry.clone(),
            store.clone(),
            metrics.clone(),
            leaderboard,
            hub.clone(),
        );

        Arc::new(Self {
            config,
            registry,
            store,
            metrics,
            snapshots,
            hub,
            ingestion,
        })
    }
}
