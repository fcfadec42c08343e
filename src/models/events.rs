// SPDX-License-Identifier: MIT

//! Events delivered over the live feed.

use crate::models::LeaderboardEntry;
use serde::{Deserialize, Serialize};

/// Result of ingesting one GPS fix, broadcast to the race feed and returned
/// to the posting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerUpdateEvent {
    pub runner_id: u64,
    pub name: String,
    pub bib_number: u32,
    pub latitude: f64,
    pub longitude: f64,
    /// Distance accrued by this fix (0.0 when jitter-filtered)
    pub segment_m: f64,
    pub distance_m: f64,
    pub moving_time_s: f64,
    pub pace_s_per_km: Option<f64>,
    pub speed_kmh: Option<f64>,
    /// RFC3339 timestamp of the fix
    pub timestamp: String,
}

/// Server-to-client feed messages, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Connection confirmation, sent once on subscribe.
    Info { message: String },
    /// Full ranked list, sent once on subscribe.
    LeaderboardSnapshot { entries: Vec<LeaderboardEntry> },
    /// Single runner update.
    RaceUpdate(RunnerUpdateEvent),
    /// Full re-ranked list after any change.
    LeaderboardUpdate { entries: Vec<LeaderboardEntry> },
    /// Periodic liveness signal; one-way, no ack expected.
    Ping,
}
