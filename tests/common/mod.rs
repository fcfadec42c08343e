// SPDX-License-Identifier: MIT

//! Shared test fixtures.

#![allow(dead_code)]

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use race_tracker::{
    config::Config,
    models::{Coordinate, PointId, Race, RaceState, Runner, TrackingPoint},
    services::RaceRegistry,
    store::{MemoryTrackStore, StoreError, TrackStore},
    AppState,
};
use std::sync::Arc;
use std::time::Duration;

/// Registry with one running race, one scheduled race, and three runners.
pub fn test_registry() -> Arc<RaceRegistry> {
    let registry = RaceRegistry::new();
    registry.insert_race(Race {
        id: 1,
        name: "City Marathon".to_string(),
        category: "Marathon".to_string(),
        state: RaceState::Running,
    });
    registry.insert_race(Race {
        id: 2,
        name: "Spring 5K".to_string(),
        category: "5K".to_string(),
        state: RaceState::Scheduled,
    });
    for id in [101u64, 102, 103] {
        registry.insert_runner(Runner {
            id,
            first_name: "Runner".to_string(),
            last_name: format!("{}", id),
            bib_number: id as u32,
        });
    }
    Arc::new(registry)
}

/// Test config: long heartbeat so pings do not interleave with assertions.
pub fn test_config() -> Config {
    Config {
        heartbeat_interval: Duration::from_secs(60),
        send_timeout: Duration::from_millis(200),
        ..Config::default()
    }
}

pub fn create_test_state() -> Arc<AppState> {
    create_test_state_with(test_config())
}

pub fn create_test_state_with(config: Config) -> Arc<AppState> {
    AppState::build(config, test_registry(), Arc::new(MemoryTrackStore::new()))
}

pub fn create_test_app() -> (Router, Arc<AppState>) {
    let state = create_test_state();
    (race_tracker::routes::create_router(state.clone()), state)
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Store whose every operation reports storage unavailable.
pub struct FailingStore;

impl TrackStore for FailingStore {
    fn append(
        &self,
        _runner_id: u64,
        _race_id: u64,
        _coord: Coordinate,
        _timestamp: DateTime<Utc>,
    ) -> Result<PointId, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn last_point(
        &self,
        _runner_id: u64,
        _race_id: u64,
    ) -> Result<Option<TrackingPoint>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn points(&self, _runner_id: u64, _race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn latest_per_runner(&self, _race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn drain_race(&self, _race_id: u64) -> Result<Vec<TrackingPoint>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}
