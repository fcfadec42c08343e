// SPDX-License-Identifier: MIT

//! Incremental per-runner metrics.
//!
//! Each (runner, race) pair has one cached `RunnerTrackState`, mutated in
//! place as fixes arrive. The full track is never re-scanned on the hot path;
//! `rebuild` exists for cold start against a populated store and for explicit
//! repair.

use crate::geo::{self, GeoError};
use crate::models::{Coordinate, TrackingPoint};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Derived aggregate state for one runner in one race.
#[derive(Debug, Clone)]
pub struct RunnerTrackState {
    pub runner_id: u64,
    pub race_id: u64,
    /// Moving distance net of jitter-filtered segments, meters.
    pub distance_m: f64,
    /// Time spent on accrued segments, seconds.
    pub moving_time_s: f64,
    pub last_point: Coordinate,
    pub last_timestamp: DateTime<Utc>,
}

impl RunnerTrackState {
    fn cold_start(runner_id: u64, race_id: u64, coord: Coordinate, ts: DateTime<Utc>) -> Self {
        Self {
            runner_id,
            race_id,
            distance_m: 0.0,
            moving_time_s: 0.0,
            last_point: coord,
            last_timestamp: ts,
        }
    }

    /// Seconds per kilometre; undefined until any distance has accrued.
    pub fn pace_s_per_km(&self) -> Option<f64> {
        if self.distance_m > 0.0 {
            Some(self.moving_time_s / (self.distance_m / 1000.0))
        } else {
            None
        }
    }

    /// km/h; undefined until any moving time has accrued.
    pub fn speed_kmh(&self) -> Option<f64> {
        if self.moving_time_s > 0.0 {
            Some(self.distance_m / self.moving_time_s * 3.6)
        } else {
            None
        }
    }
}

/// Result of feeding one fix through the engine.
#[derive(Debug, Clone)]
pub struct MetricsUpdate {
    pub state: RunnerTrackState,
    /// Distance this fix contributed (0.0 when filtered).
    pub segment_m: f64,
}

/// Consumes fixes and maintains `RunnerTrackState` per (runner, race).
///
/// The DashMap entry guard serializes updates for one key while unrelated
/// runners proceed on other shards, so `distance_m` stays monotonic without
/// a race-wide lock.
pub struct MetricsEngine {
    states: DashMap<(u64, u64), RunnerTrackState>,
    jitter_threshold_m: f64,
}

impl MetricsEngine {
    pub fn new(jitter_threshold_m: f64) -> Self {
        Self {
            states: DashMap::new(),
            jitter_threshold_m,
        }
    }

    /// Whether a cached state exists for this (runner, race).
    pub fn has_state(&self, runner_id: u64, race_id: u64) -> bool {
        self.states.contains_key(&(race_id, runner_id))
    }

    pub fn state(&self, runner_id: u64, race_id: u64) -> Option<RunnerTrackState> {
        self.states.get(&(race_id, runner_id)).map(|s| s.clone())
    }

    /// All cached states for a race. Snapshot semantics: concurrent in-flight
    /// updates may or may not be visible, but every returned state is a
    /// complete, consistent value.
    pub fn race_states(&self, race_id: u64) -> Vec<RunnerTrackState> {
        self.states
            .iter()
            .filter(|entry| entry.key().0 == race_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Drop all cached states for a race (archival).
    pub fn clear_race(&self, race_id: u64) {
        self.states.retain(|key, _| key.0 != race_id);
    }

    /// Apply one fix, returning the updated state and its segment
    /// contribution.
    pub fn update(
        &self,
        runner_id: u64,
        race_id: u64,
        coord: Coordinate,
        timestamp: DateTime<Utc>,
    ) -> Result<MetricsUpdate, GeoError> {
        match self.states.entry((race_id, runner_id)) {
            Entry::Vacant(vacant) => {
                let state = RunnerTrackState::cold_start(runner_id, race_id, coord, timestamp);
                let state = vacant.insert(state).clone();
                Ok(MetricsUpdate {
                    state,
                    segment_m: 0.0,
                })
            }
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                let segment_m = step(state, coord, timestamp, self.jitter_threshold_m)?;
                Ok(MetricsUpdate {
                    state: state.clone(),
                    segment_m,
                })
            }
        }
    }

    /// Build a runner's state from their stored track, only if no cached
    /// state exists. The presence check and the insert happen under one entry
    /// guard, so a rebuild from history can never replace a state that a
    /// concurrent update has already advanced past that history.
    ///
    /// Returns whether a state was installed.
    pub fn rebuild_if_absent(
        &self,
        runner_id: u64,
        race_id: u64,
        points: &[TrackingPoint],
    ) -> Result<bool, GeoError> {
        let Some(first) = points.first() else {
            return Ok(false);
        };

        match self.states.entry((race_id, runner_id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                let mut state =
                    RunnerTrackState::cold_start(runner_id, race_id, first.coord, first.timestamp);
                for point in &points[1..] {
                    step(&mut state, point.coord, point.timestamp, self.jitter_threshold_m)?;
                }
                vacant.insert(state);
                Ok(true)
            }
        }
    }

    /// Rebuild a runner's state from their full stored track, replacing any
    /// cached value. Explicit repair only; the ingest path uses
    /// `rebuild_if_absent`.
    pub fn rebuild(
        &self,
        runner_id: u64,
        race_id: u64,
        points: &[TrackingPoint],
    ) -> Result<Option<RunnerTrackState>, GeoError> {
        let Some(first) = points.first() else {
            self.states.remove(&(race_id, runner_id));
            return Ok(None);
        };

        let mut state =
            RunnerTrackState::cold_start(runner_id, race_id, first.coord, first.timestamp);
        for point in &points[1..] {
            step(&mut state, point.coord, point.timestamp, self.jitter_threshold_m)?;
        }

        self.states.insert((race_id, runner_id), state.clone());
        Ok(Some(state))
    }
}

/// Advance a state by one fix. Returns the accrued segment distance.
///
/// Non-positive elapsed time (clock skew, duplicate or out-of-order
/// timestamps) and sub-threshold segments both take the jitter path: the
/// reference point advances but nothing accrues, so aggregates never go
/// backwards and pace stays finite.
fn step(
    state: &mut RunnerTrackState,
    coord: Coordinate,
    timestamp: DateTime<Utc>,
    jitter_threshold_m: f64,
) -> Result<f64, GeoError> {
    let elapsed_s = (timestamp - state.last_timestamp).num_milliseconds() as f64 / 1000.0;

    if elapsed_s <= 0.0 {
        tracing::warn!(
            runner_id = state.runner_id,
            race_id = state.race_id,
            elapsed_s,
            "Clock anomaly: non-monotonic timestamp, treating as zero-length segment"
        );
        state.last_point = coord;
        state.last_timestamp = timestamp;
        return Ok(0.0);
    }

    let segment_m = geo::distance(state.last_point, coord)?;
    state.last_point = coord;
    state.last_timestamp = timestamp;

    if segment_m < jitter_threshold_m {
        return Ok(0.0);
    }

    state.distance_m += segment_m;
    state.moving_time_s += elapsed_s;
    Ok(segment_m)
}
