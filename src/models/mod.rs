// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod events;
pub mod leaderboard;
pub mod point;
pub mod race;

pub use events::{FeedEvent, RunnerUpdateEvent};
pub use leaderboard::{LeaderboardEntry, RunnerStatus};
pub use point::{Coordinate, PointId, TrackingPoint};
pub use race::{Race, RaceState, Roster, Runner};
