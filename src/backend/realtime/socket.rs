/**
 * WebSocket Endpoint
 *
 * `GET /ws` upgrades to a collaboration socket. The handshake token comes
 * from the `token` query parameter or an `Authorization: Bearer` header.
 *
 * # Connection Tasks
 *
 * - a writer task drains the connection's outbound queue into the socket
 * - the reader loop decodes frames and awaits each command before reading
 *   the next one
 *
 * When the reader ends the connection is removed from the registry, which
 * drops the last queue sender and lets the writer finish.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::backend::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Pick the handshake token from the query or the Authorization header
pub fn handshake_token(query: &HandshakeQuery, headers: &HeaderMap) -> String {
    query
        .token
        .clone()
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .unwrap_or_default()
}

/// Handle `GET /ws`
pub async fn handle_socket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = handshake_token(&query, &headers);
    ws.on_upgrade(move |socket| run_connection(state, socket, token))
}

async fn run_connection(state: AppState, socket: WebSocket, token: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel(state.config.outbound_queue_capacity);

    let connection = match state.registry.admit(&token, tx).await {
        Ok(connection) => connection,
        Err(_) => {
            // flush the queued error frame, then close
            while let Ok(frame) = rx.try_recv() {
                if let Ok(text) = frame.to_json() {
                    let _ = sink.send(Message::Text(text.into())).await;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match frame.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("[Realtime] Failed to serialize frame: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                state
                    .dispatcher
                    .handle_text(connection.id, text.as_str())
                    .await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Realtime] Socket error on {}: {}", connection.id, e);
                break;
            }
        }
    }

    state.rooms.disconnect(connection.id).await;
    let _ = writer.await;
}
