//! WebSocket upgrade handler and per-connection session loop

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::gateway::Gateway;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Query parameters for WebSocket connection. Identity is established by an
/// external collaborator; the core only consumes an identifier, a display
/// name, and whether the connection is authenticated.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// External user identifier, present for authenticated connections
    pub user_id: Option<Uuid>,
    /// Display name
    pub username: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, query: WsQuery, state: AppState) {
    // Every socket gets its own connection id; player and stat entries in a
    // room are keyed by it
    let conn = Uuid::new_v4();
    let authenticated = query.user_id.is_some();
    let display_name = query
        .username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("Player_{}", &conn.to_string()[..8]));

    info!(conn = %conn, name = %display_name, authenticated, "New WebSocket connection");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Register the writer channel with the gateway
    let mut outbound_rx = state.gateway.register(conn);

    state.gateway.emit_to_connection(
        conn,
        ServerMsg::Welcome {
            connection_id: conn,
            server_time: unix_millis(),
        },
    );

    // Writer task: gateway channel -> WebSocket
    let writer_conn = conn;
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(conn = %writer_conn, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> room dispatch
    let rate_limiter = ConnectionRateLimiter::new();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(conn = %conn, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => dispatch(conn, &display_name, msg, &state),
                    Err(e) => {
                        // Malformed input never crashes a room; drop it
                        warn!(conn = %conn, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(conn = %conn, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn = %conn, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn = %conn, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Disconnect: remove the player and its cooldown entry from the room;
    // the round continues for everyone else
    if let Some(room_id) = state.gateway.room_of(conn) {
        if let Some(room) = state.registry.get(&room_id) {
            room.lock().remove_player(conn);
        }
    }
    state.gateway.unregister(conn);
    writer_handle.abort();

    info!(conn = %conn, "WebSocket connection closed");
}

/// Route one parsed message into the room layer. Runs to completion without
/// awaiting, so each message's mutations are atomic per room.
fn dispatch(conn: Uuid, display_name: &str, msg: ClientMsg, state: &AppState) {
    match msg {
        ClientMsg::JoinRoom { room_id } => {
            state.gateway.join_room(conn, &room_id);
            state.registry.get_or_create(&room_id);
            debug!(conn = %conn, room_id = %room_id, "Joined room");
        }

        ClientMsg::UpdateSelf {
            username,
            rotation,
            fire,
            keyboard,
            ..
        } => {
            let Some(room_id) = state.gateway.room_of(conn) else {
                debug!(conn = %conn, "Input before joining a room, dropped");
                return;
            };
            let Some(room) = state.registry.get(&room_id) else {
                return;
            };

            let name = if username.trim().is_empty() {
                display_name
            } else {
                username.trim()
            };

            room.lock().handle_input(
                conn,
                name,
                rotation,
                fire,
                &keyboard,
                state.gateway.as_ref(),
            );
        }

        ClientMsg::AddWall { wall } => {
            let Some(room_id) = state.gateway.room_of(conn) else {
                return;
            };
            if let Some(room) = state.registry.get(&room_id) {
                room.lock().add_wall(wall);
            }
        }

        ClientMsg::Ping { .. } => {
            state
                .gateway
                .emit_to_connection(conn, ServerMsg::Pong { t: unix_millis() });
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
