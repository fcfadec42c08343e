// SPDX-License-Identifier: MIT

//! Read model for dashboards and newly connected feed viewers.

use crate::models::{FeedEvent, RunnerStatus, RunnerUpdateEvent, TrackingPoint};
use crate::services::{LeaderboardEngine, MetricsEngine, RaceRegistry};
use crate::store::{StoreError, TrackStore};
use crate::time_utils::format_utc_rfc3339;
use std::sync::Arc;

/// Assembles the current picture of a race: latest position and aggregates
/// per runner, plus the ranked leaderboard. Shared by the dashboard endpoint
/// and by the hub's initial synchronization on subscribe.
pub struct SnapshotService {
    store: Arc<dyn TrackStore>,
    metrics: Arc<MetricsEngine>,
    leaderboard: Arc<LeaderboardEngine>,
    registry: Arc<RaceRegistry>,
}

impl SnapshotService {
    pub fn new(
        store: Arc<dyn TrackStore>,
        metrics: Arc<MetricsEngine>,
        leaderboard: Arc<LeaderboardEngine>,
        registry: Arc<RaceRegistry>,
    ) -> Self {
        Self {
            store,
            metrics,
            leaderboard,
            registry,
        }
    }

    pub fn leaderboard(&self, race_id: u64) -> Vec<crate::models::LeaderboardEntry> {
        self.leaderboard.compute(race_id)
    }

    /// Latest status per runner active in the race, ordered by runner id.
    pub fn runner_statuses(&self, race_id: u64) -> Result<Vec<RunnerStatus>, StoreError> {
        let latest = self.store.latest_per_runner(race_id)?;
        Ok(latest
            .into_iter()
            .map(|point| self.status_from_point(point))
            .collect())
    }

    /// Events bringing a fresh subscriber up to date: the leaderboard
    /// snapshot followed by each runner's latest known position.
    pub fn feed_snapshot(&self, race_id: u64) -> Result<Vec<FeedEvent>, StoreError> {
        let mut events = vec![FeedEvent::LeaderboardSnapshot {
            entries: self.leaderboard.compute(race_id),
        }];
        for status in self.runner_statuses(race_id)? {
            events.push(FeedEvent::RaceUpdate(RunnerUpdateEvent {
                runner_id: status.runner_id,
                name: status.name,
                bib_number: status.bib_number,
                latitude: status.latitude,
                longitude: status.longitude,
                segment_m: 0.0,
                distance_m: status.distance_m,
                moving_time_s: status.moving_time_s,
                pace_s_per_km: status.pace_s_per_km,
                speed_kmh: status.speed_kmh,
                timestamp: status.timestamp,
            }));
        }
        Ok(events)
    }

    fn status_from_point(&self, point: TrackingPoint) -> RunnerStatus {
        let runner = self.registry.runner(point.runner_id);
        let state = self.metrics.state(point.runner_id, point.race_id);

        RunnerStatus {
            runner_id: point.runner_id,
            name: runner
                .as_ref()
                .map(|r| r.display_name())
                .unwrap_or_else(|| "Unknown".to_string()),
            bib_number: runner.map(|r| r.bib_number).unwrap_or(0),
            latitude: point.coord.latitude,
            longitude: point.coord.longitude,
            timestamp: format_utc_rfc3339(point.timestamp),
            distance_m: state.as_ref().map(|s| s.distance_m).unwrap_or(0.0),
            moving_time_s: state.as_ref().map(|s| s.moving_time_s).unwrap_or(0.0),
            pace_s_per_km: state.as_ref().and_then(|s| s.pace_s_per_km()),
            speed_kmh: state.and_then(|s| s.speed_kmh()),
        }
    }
}
