// SPDX-License-Identifier: MIT

//! WebSocket live feed, one connection per race.

use crate::error::AppError;
use crate::hub::SubscriptionHandle;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws/races/{race_id}", get(ws_handler))
}

/// Commands viewers may send; the feed is otherwise receive-only.
#[derive(Deserialize)]
struct ClientCommand {
    cmd: String,
}

async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<u64>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    state
        .registry
        .race(race_id)
        .ok_or_else(|| AppError::NotFound(format!("Race {} not found", race_id)))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(state, race_id, socket)))
}

/// Pump hub events to the socket and client commands back, until either side
/// closes. Unsubscribing on exit tears down the heartbeat and releases the
/// race-group slot.
async fn handle_socket(state: Arc<AppState>, race_id: u64, socket: WebSocket) {
    let (handle, mut events) = match state.hub.subscribe(race_id).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::warn!(race_id, error = %e, "Subscribe failed, closing socket");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(race_id, error = %e, "Failed to serialize feed event");
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&state, &handle, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {} // binary/ping/pong: ignored
                }
            }
        }
    }

    state.hub.unsubscribe(&handle);
    tracing::debug!(race_id, "Feed connection closed");
}

async fn handle_client_message(state: &AppState, handle: &SubscriptionHandle, text: &str) {
    let Ok(command) = serde_json::from_str::<ClientCommand>(text) else {
        tracing::debug!("Ignoring malformed client message");
        return;
    };

    match command.cmd.as_str() {
        "get_last" => {
            if let Err(e) = state.hub.resend_snapshot(handle).await {
                tracing::warn!(error = %e, "Failed to resend snapshot");
            }
        }
        other => tracing::debug!(cmd = other, "Ignoring unknown client command"),
    }
}
