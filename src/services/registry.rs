// SPDX-License-Identifier: MIT

//! Race and runner roster lookup, plus race lifecycle transitions.
//!
//! Registration CRUD lives in an external system; this service only resolves
//! identities and tracks race state. State transitions invoke explicitly
//! registered callbacks synchronously, so the causal chain (e.g. "race
//! started, archive stale tracks") stays visible and testable.

use crate::models::{Race, RaceState, Roster, Runner};
use crate::store::TrackStore;
use dashmap::DashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Callback invoked after a race changes state: `(race, previous_state)`.
pub type TransitionCallback = Box<dyn Fn(&Race, RaceState) + Send + Sync>;

/// In-memory roster registry, seeded from a JSON file at startup.
#[derive(Default)]
pub struct RaceRegistry {
    races: DashMap<u64, Race>,
    runners: DashMap<u64, Runner>,
    listeners: Mutex<Vec<TransitionCallback>>,
}

impl RaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a roster from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let json_data =
            fs::read_to_string(path.as_ref()).map_err(|e| RosterError::IoError(e.to_string()))?;
        Self::load_from_json(&json_data)
    }

    /// Load a roster from a JSON string.
    pub fn load_from_json(json_data: &str) -> Result<Self, RosterError> {
        let roster: Roster =
            serde_json::from_str(json_data).map_err(|e| RosterError::ParseError(e.to_string()))?;

        let registry = Self::new();
        for race in roster.races {
            registry.races.insert(race.id, race);
        }
        for runner in roster.runners {
            registry.runners.insert(runner.id, runner);
        }

        tracing::info!(
            races = registry.races.len(),
            runners = registry.runners.len(),
            "Roster loaded"
        );
        Ok(registry)
    }

    pub fn insert_race(&self, race: Race) {
        self.races.insert(race.id, race);
    }

    pub fn insert_runner(&self, runner: Runner) {
        self.runners.insert(runner.id, runner);
    }

    pub fn race(&self, race_id: u64) -> Option<Race> {
        self.races.get(&race_id).map(|r| r.clone())
    }

    pub fn runner(&self, runner_id: u64) -> Option<Runner> {
        self.runners.get(&runner_id).map(|r| r.clone())
    }

    pub fn races(&self) -> Vec<Race> {
        self.races.iter().map(|r| r.clone()).collect()
    }

    /// Register a state-transition callback.
    pub fn on_transition(&self, callback: TransitionCallback) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push(callback);
    }

    /// Change a race's state and invoke transition callbacks synchronously.
    /// No-op (and no callbacks) when the state is unchanged.
    pub fn set_race_state(&self, race_id: u64, state: RaceState) -> Result<(), RosterError> {
        let updated = {
            let mut race = self
                .races
                .get_mut(&race_id)
                .ok_or(RosterError::UnknownRace(race_id))?;
            let previous = race.state;
            if previous == state {
                return Ok(());
            }
            race.state = state;
            (race.clone(), previous)
        };

        tracing::info!(
            race_id,
            from = ?updated.1,
            to = ?state,
            "Race state transition"
        );

        let listeners = self.listeners.lock().expect("listener lock poisoned");
        for listener in listeners.iter() {
            listener(&updated.0, updated.1);
        }
        Ok(())
    }

    /// Flip finished races to archived, without firing transition callbacks
    /// (archival is terminal bookkeeping, not a new lifecycle event).
    pub fn archive_finished_races(&self) -> Vec<u64> {
        let mut archived = Vec::new();
        for mut race in self.races.iter_mut() {
            if race.state == RaceState::Finished {
                race.state = RaceState::Archived;
                archived.push(race.id);
            }
        }
        archived
    }
}

/// Register the archival transition callback: when a race enters `running`,
/// drain stored points of every race that is not running and flip finished
/// races to archived.
///
/// The callback holds only a weak registry reference so it does not keep its
/// own owner alive.
pub fn register_archiver(registry: &Arc<RaceRegistry>, store: Arc<dyn TrackStore>) {
    let weak = Arc::downgrade(registry);
    registry.on_transition(Box::new(move |race, _previous| {
        if race.state != RaceState::Running {
            return;
        }
        let Some(registry) = weak.upgrade() else { return };

        for stale in registry.races() {
            if stale.state == RaceState::Running {
                continue;
            }
            match store.drain_race(stale.id) {
                Ok(points) if !points.is_empty() => {
                    tracing::info!(
                        race_id = stale.id,
                        count = points.len(),
                        "Archived tracking points"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(race_id = stale.id, error = %e, "Failed to archive points")
                }
            }
        }

        let archived = registry.archive_finished_races();
        if !archived.is_empty() {
            tracing::info!(races = ?archived, "Races archived");
        }
    }));
}

/// Errors from roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read roster file: {0}")]
    IoError(String),

    #[error("Failed to parse roster JSON: {0}")]
    ParseError(String),

    #[error("Unknown race: {0}")]
    UnknownRace(u64),
}
