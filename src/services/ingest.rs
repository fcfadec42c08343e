// SPDX-License-Identifier: MIT

//! Ingestion pipeline.
//!
//! Orchestrates one incoming GPS fix end to end:
//! 1. Resolve race and runner identities
//! 2. Validate the coordinate
//! 3. Durably append the point
//! 4. Update the runner's incremental metrics
//! 5. Recompute the race leaderboard
//! 6. Broadcast both events to the race's subscribers

use crate::error::{AppError, Result};
use crate::hub::BroadcastHub;
use crate::models::{Coordinate, FeedEvent, RunnerUpdateEvent};
use crate::services::{LeaderboardEngine, MetricsEngine, RaceRegistry};
use crate::store::TrackStore;
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct IngestionService {
    registry: Arc<RaceRegistry>,
    store: Arc<dyn TrackStore>,
    metrics: Arc<MetricsEngine>,
    leaderboard: Arc<LeaderboardEngine>,
    hub: Arc<BroadcastHub>,
}

impl IngestionService {
    pub fn new(
        registry: Arc<RaceRegistry>,
        store: Arc<dyn TrackStore>,
        metrics: Arc<MetricsEngine>,
        leaderboard: Arc<LeaderboardEngine>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            registry,
            store,
            metrics,
            leaderboard,
            hub,
        }
    }

    /// Ingest one GPS fix and return the resulting update event.
    ///
    /// The returned event is the synchronous result for the posting client,
    /// independent of broadcast delivery: a broadcast failure never rolls
    /// back the persisted point or fails this call. A storage failure aborts
    /// before any in-memory state is touched, so the caller can retry without
    /// corrupting aggregates.
    pub async fn ingest(
        &self,
        race_id: u64,
        runner_id: u64,
        coord: Coordinate,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<RunnerUpdateEvent> {
        self.registry
            .race(race_id)
            .ok_or_else(|| AppError::NotFound(format!("Race {} not found", race_id)))?;
        let runner = self
            .registry
            .runner(runner_id)
            .ok_or_else(|| AppError::NotFound(format!("Runner {} not found", runner_id)))?;

        if !coord.is_valid() {
            return Err(AppError::InvalidInput(format!(
                "Coordinate out of range: ({}, {})",
                coord.latitude, coord.longitude
            )));
        }

        let timestamp = timestamp.unwrap_or_else(Utc::now);

        // Cold start with prior durable points (process restart): rebuild the
        // aggregate from history before folding in the new fix. Conditional
        // install: when concurrent cold starts race, the loser's rebuild is a
        // no-op instead of overwriting state built from fresher history.
        if !self.metrics.has_state(runner_id, race_id) {
            let history = self.store.points(runner_id, race_id)?;
            let rebuilt = self
                .metrics
                .rebuild_if_absent(runner_id, race_id, &history)
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
            if rebuilt {
                tracing::info!(runner_id, race_id, points = history.len(), "Rebuilt track state");
            }
        }

        let point_id = self.store.append(runner_id, race_id, coord, timestamp)?;

        let update = self
            .metrics
            .update(runner_id, race_id, coord, timestamp)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        tracing::debug!(
            runner_id,
            race_id,
            point_id,
            segment_m = update.segment_m,
            distance_m = update.state.distance_m,
            "Point ingested"
        );

        let event = RunnerUpdateEvent {
            runner_id,
            name: runner.display_name(),
            bib_number: runner.bib_number,
            latitude: coord.latitude,
            longitude: coord.longitude,
            segment_m: update.segment_m,
            distance_m: update.state.distance_m,
            moving_time_s: update.state.moving_time_s,
            pace_s_per_km: update.state.pace_s_per_km(),
            speed_kmh: update.state.speed_kmh(),
            timestamp: format_utc_rfc3339(timestamp),
        };

        let entries = self.leaderboard.compute(race_id);
        self.hub
            .publish(race_id, FeedEvent::RaceUpdate(event.clone()))
            .await;
        self.hub
            .publish(race_id, FeedEvent::LeaderboardUpdate { entries })
            .await;

        Ok(event)
    }
}
