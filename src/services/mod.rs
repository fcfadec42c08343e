// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod ingest;
pub mod leaderboard;
pub mod metrics;
pub mod registry;
pub mod snapshot;

pub use ingest::IngestionService;
pub use leaderboard::LeaderboardEngine;
pub use metrics::{MetricsEngine, MetricsUpdate, RunnerTrackState};
pub use registry::{register_archiver, RaceRegistry, RosterError};
pub use snapshot::SnapshotService;
