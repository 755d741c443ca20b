//! WebSocket feed of realtime call events.
//!
//! Clients subscribe per call; every event the use case publishes for that
//! call is forwarded as a JSON text frame. A subscriber that falls behind
//! the broadcast channel misses the skipped events and should reconcile via
//! `GET /calls/{callId}/status`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

pub async fn call_events(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| stream_events(socket, state, call_id))
}

async fn stream_events(socket: WebSocket, state: AppState, call_id: String) {
    let mut events = state.events.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            received = events.recv() => {
                match received {
                    Ok(published) if published.call_id == call_id => {
                        let frame = match serde_json::to_string(&published) {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!("[WS] could not serialize event: {e}");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {} // another call's event
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            "[WS] subscriber of call {call_id} lagged, missed {missed} events"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = stream.next() => {
                // Clients only listen; any close or error tears down the feed.
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
    tracing::debug!("[WS] event feed for call {call_id} closed");
}
