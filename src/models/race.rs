// SPDX-License-Identifier: MIT

//! Race and runner roster models.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a race. Transitions are driven externally; the core
/// only reads the state to decide dashboard inclusion and archival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceState {
    Scheduled,
    Running,
    Finished,
    Archived,
}

/// A race event (5K, marathon, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub id: u64,
    pub name: String,
    /// Category name ("5K", "Half Marathon", ...)
    pub category: String,
    pub state: RaceState,
}

/// A registered runner. Identity is owned by the registration system;
/// the tracker only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub bib_number: u32,
}

impl Runner {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Roster file contents (`data/roster.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub races: Vec<Race>,
    pub runners: Vec<Runner>,
}
