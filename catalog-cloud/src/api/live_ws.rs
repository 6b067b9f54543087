//! Live update WebSocket
//!
//! GET /api/live/ws[?client_id=<uuid>]
//!
//! Server → listener only: every `LiveEvent` is sent as one JSON text frame.
//! Without `client_id` the listener receives events for all clients.

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time::Duration;
use uuid::Uuid;

use crate::live::LiveEvent;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/live/ws", get(handle_live_ws))
}

#[derive(Debug, Default, Deserialize)]
pub struct LiveQuery {
    client_id: Option<Uuid>,
}

pub async fn handle_live_ws(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| live_session(socket, state, query.client_id))
}

async fn live_session(socket: WebSocket, state: AppState, client_id: Option<Uuid>) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = state.live.subscribe(client_id);

    tracing::info!(client_id = ?client_id, "Live WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(client_id = ?client_id, lagged = n, "Live subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(client_id = ?client_id, "Live WS disconnected");
}

async fn send_event<S>(sink: &mut S, event: &LiveEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
