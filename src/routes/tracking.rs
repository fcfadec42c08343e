// SPDX-License-Identifier: MIT

//! Ingestion and dashboard endpoints.

use crate::error::{AppError, Result};
use crate::models::{Coordinate, LeaderboardEntry, RaceState, RunnerStatus, RunnerUpdateEvent};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Ingestion routes (optional bearer guard applied in routes/mod.rs).
pub fn ingest_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/races/{race_id}/location", post(post_location))
}

/// Public read-model routes.
pub fn viewer_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/races/{race_id}/dashboard", get(get_dashboard))
}

// ─── Ingestion ───────────────────────────────────────────────

/// One GPS fix from a runner's device.
#[derive(Deserialize, Validate)]
pub struct LocationRequest {
    pub runner_id: u64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Defaults to ingestion time when the device does not report one.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Ingest a GPS fix and return the computed update.
///
/// The response reflects durable state only; broadcast delivery to viewers
/// is best-effort and does not affect the status code.
async fn post_location(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<u64>,
    Json(req): Json<LocationRequest>,
) -> Result<Json<RunnerUpdateEvent>> {
    req.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let event = state
        .ingestion
        .ingest(
            race_id,
            req.runner_id,
            Coordinate::new(req.latitude, req.longitude),
            req.timestamp,
        )
        .await?;

    Ok(Json(event))
}

// ─── Dashboard ───────────────────────────────────────────────

/// Read model served on page load, before the first live event arrives.
#[derive(Serialize)]
pub struct DashboardResponse {
    pub race_id: u64,
    pub race_name: String,
    pub race_state: RaceState,
    pub runners: Vec<RunnerStatus>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Current race picture: latest position and aggregates per runner.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<u64>,
) -> Result<Json<DashboardResponse>> {
    let race = state
        .registry
        .race(race_id)
        .ok_or_else(|| AppError::NotFound(format!("Race {} not found", race_id)))?;

    let runners = state.snapshots.runner_statuses(race_id)?;
    let leaderboard = state.snapshots.leaderboard(race_id);

    Ok(Json(DashboardResponse {
        race_id,
        race_name: race.name,
        race_state: race.state,
        runners,
        leaderboard,
    }))
}
