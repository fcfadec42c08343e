// SPDX-License-Identifier: MIT

//! Leaderboard and dashboard read-model types.

use serde::{Deserialize, Serialize};

/// One ranked row. Rank is dense and deterministic: distance descending,
/// ties broken by runner id ascending, ranks assigned 1..N.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub runner_id: u64,
    pub name: String,
    pub bib_number: u32,
    pub distance_m: f64,
}

/// Per-runner dashboard row: latest known position plus current aggregates.
/// Served on page load so viewers are not blank before the first live event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerStatus {
    pub runner_id: u64,
    pub name: String,
    pub bib_number: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// RFC3339 timestamp of the latest point
    pub timestamp: String,
    pub distance_m: f64,
    pub moving_time_s: f64,
    pub pace_s_per_km: Option<f64>,
    pub speed_kmh: Option<f64>,
}
