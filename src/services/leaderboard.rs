// SPDX-License-Identifier: MIT

//! Race leaderboard ranking.

use crate::models::{LeaderboardEntry, Runner};
use crate::services::{MetricsEngine, RaceRegistry, RunnerTrackState};
use std::sync::Arc;

/// Ranks the runners of a race by cumulative distance.
///
/// A full re-sort per update is O(R log R) and fine for race fields in the
/// hundreds; the read side only ever sees a complete ranking.
pub struct LeaderboardEngine {
    metrics: Arc<MetricsEngine>,
    registry: Arc<RaceRegistry>,
}

impl LeaderboardEngine {
    pub fn new(metrics: Arc<MetricsEngine>, registry: Arc<RaceRegistry>) -> Self {
        Self { metrics, registry }
    }

    /// Current ranking for a race. Empty when no runner has reported yet.
    pub fn compute(&self, race_id: u64) -> Vec<LeaderboardEntry> {
        let states = self.metrics.race_states(race_id);
        Self::rank(states, |runner_id| self.registry.runner(runner_id))
    }

    /// Deterministic ranking: distance descending, ties broken by runner id
    /// ascending, dense ranks 1..N.
    pub fn rank(
        mut states: Vec<RunnerTrackState>,
        lookup: impl Fn(u64) -> Option<Runner>,
    ) -> Vec<LeaderboardEntry> {
        states.sort_by(|a, b| {
            b.distance_m
                .total_cmp(&a.distance_m)
                .then(a.runner_id.cmp(&b.runner_id))
        });

        states
            .into_iter()
            .enumerate()
            .map(|(i, state)| {
                let runner = lookup(state.runner_id);
                LeaderboardEntry {
                    rank: i as u32 + 1,
                    runner_id: state.runner_id,
                    name: runner
                        .as_ref()
                        .map(Runner::display_name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    bib_number: runner.map(|r| r.bib_number).unwrap_or(0),
                    distance_m: state.distance_m,
                }
            })
            .collect()
    }
}
