//! WebSocket transport: pumps frames between sockets and the hub.
//!
//! Each socket gets a [`Connection`] whose receiving half is drained by a
//! writer task. The reader task parses move frames and applies them to the
//! seated game. When either task finishes the other is aborted.

use crate::connection::{Connection, ConnectionId};
use crate::hub::{HubError, HubHandle, SeatTicket};
use crate::identity::{IdentityError, IdentityService, JwtIdentity};
use crate::protocol::{ClientEvent, ServerMessage};
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Shared handler state.
#[derive(Clone, derive_new::new)]
pub struct AppState {
    hub: HubHandle,
    identity: Arc<dyn IdentityService>,
    outbound_capacity: usize,
}

/// Query parameters of the `/ws` upgrade. Both present means reconnect.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Game the client was seated in.
    pub game: Option<usize>,
    /// Identity token issued at admission.
    pub token: Option<String>,
}

/// Builds the HTTP router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, params, socket))
}

#[instrument(skip_all, fields(reconnect = params.token.is_some()))]
async fn handle_socket(state: AppState, params: ConnectParams, socket: WebSocket) {
    let (mut sink, stream) = socket.split();
    let (connection, mut outbound) = Connection::channel(state.outbound_capacity);
    let connection_id = connection.id();

    // Runs until the last Connection handle is dropped, which is how the
    // server hangs up on a client.
    let mut writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let ticket = match admit(&state, params, connection).await {
        Ok(ticket) => ticket,
        Err(e) => {
            debug!(%connection_id, error = %e, "Connection not seated");
            // The failure reply is already queued; let it flush.
            let _ = writer.await;
            return;
        }
    };

    let mut reader = tokio::spawn(read_moves(stream, connection_id, ticket, state.hub.clone()));

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }
    info!(%connection_id, "Socket closed");
}

/// Seats the connection: a reconnection if the client presented both a game
/// id and a token, otherwise a fresh admission under a newly minted identity.
async fn admit(
    state: &AppState,
    params: ConnectParams,
    connection: Connection,
) -> Result<SeatTicket, HubError> {
    match params {
        ConnectParams {
            game: Some(game_id),
            token: Some(token),
        } => state.hub.reconnect(game_id, token, connection).await,
        ConnectParams {
            game: None,
            token: None,
        } => {
            let player_id = JwtIdentity::new_player_id();
            let token = state.identity.mint(&player_id).map_err(|e| {
                error!(error = %e, "Failed to mint identity token");
                HubError::Identity(e)
            })?;
            state.hub.register(player_id, Some(token), connection).await
        }
        _ => {
            warn!("Incomplete reconnect request");
            let _ = connection.try_send(ServerMessage::ReconnectFailed.to_string());
            Err(HubError::Identity(IdentityError::Malformed))
        }
    }
}

/// Applies the client's move frames to its game until the socket ends or
/// the connection loses its seat.
async fn read_moves(
    mut stream: SplitStream<WebSocket>,
    connection_id: ConnectionId,
    ticket: SeatTicket,
    hub: HubHandle,
) {
    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let (board, cell) = match text.as_str().parse::<ClientEvent>() {
            Ok(ClientEvent::Move { board, cell }) => (board, cell),
            Err(e) => {
                debug!(%connection_id, error = %e, "Ignoring unparseable frame");
                continue;
            }
        };

        let result = {
            let mut game = ticket.game.lock().await;
            let Some(mark) = game.seat_of(connection_id) else {
                info!(%connection_id, game_id = ticket.game_id, "Connection no longer holds a seat");
                break;
            };
            game.make_move(mark, board, cell)
        };

        match result {
            Ok(outcome) if outcome.is_concluded() => {
                info!(game_id = ticket.game_id, ?outcome, "Releasing concluded game");
                hub.release(ticket.game_id).await;
            }
            Ok(_) => {}
            Err(e) => debug!(%connection_id, error = %e, "Move not applied"),
        }
    }
}
