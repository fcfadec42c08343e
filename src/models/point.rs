// SPDX-License-Identifier: MIT

//! Tracking point model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned point identifier. Also breaks timestamp ties: two points
/// with equal timestamps order by insertion.
pub type PointId = u64;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components finite and within valid WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One ingested GPS fix. Immutable after creation; every fix that passes
/// validation is stored, including jitter-filtered ones (audit/replay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingPoint {
    pub id: PointId,
    pub runner_id: u64,
    pub race_id: u64,
    pub coord: Coordinate,
    pub timestamp: DateTime<Utc>,
}
