// SPDX-License-Identifier: MIT

//! Optional bearer-token guard for the ingestion endpoint.
//!
//! Authentication proper lives upstream (gateway, device provisioning); this
//! guard only enforces a shared token when one is configured, and is a no-op
//! otherwise.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Reject ingestion requests without the configured bearer token.
pub async fn require_ingest_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.ingest_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(h) if h.strip_prefix("Bearer ") == Some(expected) => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}
