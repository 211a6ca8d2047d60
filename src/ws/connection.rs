//! WebSocket connection lifecycle management.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};
use ulid::Ulid;

use crate::ws::dispatcher::{self, ConnCtx};
use crate::ws::protocol::ClientToServer;
use crate::AppState;

pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let player_id = Ulid::new();
    info!(%player_id, "connection opened");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ctx = ConnCtx::new(player_id, tx);

    // Forward server pushes to the socket until the channel closes.
    let forwarder = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(_) => continue,
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Each inbound event is handled to completion before the next one is
    // read, so room mutations never interleave within a connection.
    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(&text) {
                Ok(event) => dispatcher::dispatch(&state.registry, &mut ctx, event),
                Err(err) => {
                    debug!(%player_id, %err, "malformed message");
                    ctx.error(format!("Bad message: {err}"));
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    dispatcher::handle_disconnect(&state.registry, &mut ctx);
    forwarder.abort();
    info!(%player_id, "connection closed");
}
