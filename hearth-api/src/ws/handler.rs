//! WebSocket upgrade handler and per-socket loop.

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use hearth_notify::{ConnectError, Identity, LiveConnection};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::message::ServerMessage;
use crate::state::AppState;

/// Close code sent to sockets without a valid session.
pub const CLOSE_UNAUTHORIZED: u16 = 4401;

const CLOSE_NORMAL: u16 = 1000;
const CLOSE_INTERNAL: u16 = 1011;

/// Query parameters for WebSocket connection.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Optional session token
    #[serde(default)]
    pub token: Option<String>,
}

/// WebSocket upgrade handler.
///
/// GET /ws/notifications/
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Rejection happens after the upgrade so the browser sees a close code
    let identity = match state.verifier.resolve(query.token.as_deref(), &headers) {
        Ok(identity) => Some(identity),
        Err(e) => {
            debug!(error = %e, "WebSocket without valid session");
            None
        }
    };

    ws.max_message_size(state.config.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handles a WebSocket connection.
async fn handle_socket(mut socket: WebSocket, identity: Option<Identity>, state: Arc<AppState>) {
    let live = match state.connections.connect(identity.as_ref()).await {
        Ok(live) => live,
        Err(ConnectError::Unauthenticated) => {
            send_close(&mut socket, CLOSE_UNAUTHORIZED, "unauthorized").await;
            return;
        }
        Err(ConnectError::Storage(e)) => {
            error!(error = %e, "Could not open notification channel");
            send_close(&mut socket, CLOSE_INTERNAL, "unavailable").await;
            return;
        }
    };

    run(socket, live, state.config.websocket.idle_timeout()).await;
}

/// Pumps pushes out and client frames in until either side ends.
///
/// The idle timer only restarts on client frames; outbound pushes do not
/// keep a silent client alive.
async fn run(socket: WebSocket, mut live: LiveConnection, idle_timeout: Option<Duration>) {
    let conn_id = live.id();
    let (mut sender, mut receiver) = socket.split();
    let idle_timer = tokio::time::sleep(idle_timeout.unwrap_or_default());
    tokio::pin!(idle_timer);
    let mut idle = false;

    loop {
        tokio::select! {
            push = live.recv() => {
                let Some(push) = push else { break };
                let msg = ServerMessage::from(push);
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            debug!(%conn_id, "Client went away mid-send");
                            break;
                        }
                    }
                    Err(e) => error!(%conn_id, error = %e, "Failed to serialize push"),
                }
            }
            inbound = receiver.next() => {
                let msg = match inbound {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        debug!(%conn_id, error = %e, "WebSocket read error");
                        break;
                    }
                    None => break,
                };
                if let Some(limit) = idle_timeout {
                    idle_timer.as_mut().reset(Instant::now() + limit);
                }
                match msg {
                    Message::Text(text) => live.handle_inbound(text.as_str()),
                    Message::Binary(data) => {
                        debug!(%conn_id, len = data.len(), "Ignoring binary frame");
                    }
                    Message::Ping(_) | Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }
            () = &mut idle_timer, if idle_timeout.is_some() => {
                idle = true;
                break;
            }
        }
    }

    live.close();

    if idle {
        warn!(%conn_id, "Closing idle WebSocket");
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_NORMAL,
                reason: Utf8Bytes::from_static("idle timeout"),
            })))
            .await;
    }
    info!(%conn_id, "WebSocket connection finished");
}

async fn send_close(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: Utf8Bytes::from_static(reason),
        })))
        .await;
}
