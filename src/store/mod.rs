// SPDX-License-Identifier: MIT

//! Durable storage for tracking points.
//!
//! The storage engine is a collaborator behind this trait: single-instance
//! deployments use the in-memory store, multi-instance deployments can plug
//! in a database-backed implementation without touching the ingestion path.

pub mod memory;

pub use memory::MemoryTrackStore;

use crate::models::{Coordinate, PointId, TrackingPoint};
use chrono::{DateTime, Utc};

/// Append-only, ordered per-(runner, race) point storage.
///
/// `append` must not serialize writes for unrelated (runner, race) pairs.
/// Reads return points ascending by timestamp, with server-assigned insertion
/// order breaking timestamp ties.
pub trait TrackStore: Send + Sync {
    fn append(
        &self,
        runner_id: u64,
        race_id: u64,
        coord: Coordinate,
        timestamp: DateTime<Utc>,
    ) -> Result<PointId, StoreError>;

    /// Latest point for a runner in a race, if any.
    fn last_point(&self, runner_id: u64, race_id: u64) -> Result<Option<TrackingPoint>, StoreError>;

    /// Full ordered track for a runner in a race.
    fn points(&self, runner_id: u64, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError>;

    /// Latest point per runner with any data in the race.
    fn latest_per_runner(&self, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError>;

    /// Remove and return every point of a race (archival).
    fn drain_race(&self, race_id: u64) -> Result<Vec<TrackingPoint>, StoreError>;
}

/// Storage failures. `Unavailable` is surfaced to the ingestion caller for
/// retry; a point that was not durably recorded is never reported as stored.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
