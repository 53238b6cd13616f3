//! WebSocket connection lifecycle.
//!
//! One session per socket: authenticated before upgrade, bound to at most
//! one room, messages handled in arrival order. Outbound traffic goes
//! through the session's queue so room broadcasts never block on this
//! socket's I/O.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::http::routes::AppState;
use crate::room::state::Room;
use crate::room::BattleError;
use crate::ws::dispatch;
use crate::ws::protocol::{ClientMessage, ServerMessage};

#[derive(Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: String,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(WsParams { token }): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state.auth.verify(&token).map_err(|err| {
        debug!(%err, "rejecting websocket upgrade");
        (
            StatusCode::UNAUTHORIZED,
            BattleError::Unauthenticated.to_string(),
        )
    })?;
    Ok(ws.on_upgrade(move |socket| handle_socket(state, user, socket)))
}

async fn handle_socket(state: AppState, user: UserIdentity, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let session_id = Uuid::new_v4();

    // Writer task: drains this session's queue onto the socket.
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut attached: Option<Arc<Room>> = None;

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_message(&state, &user, session_id, &tx, &mut attached, msg),
                Err(err) => {
                    debug!(user = %user.username, %err, "unparseable client message");
                    dispatch::send_to(
                        &tx,
                        &ServerMessage::Error {
                            message: BattleError::UnknownMessage.to_string(),
                        },
                    );
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    // Transport gone: detach from the room (the player record and score
    // stay) and let the registry reclaim the room if it is finished.
    if let Some(room) = attached.take() {
        room.detach(session_id);
        state.rooms.reap(&room.code);
    }
    debug!(user = %user.username, "session closed");
}

fn handle_message(
    state: &AppState,
    user: &UserIdentity,
    session_id: Uuid,
    tx: &UnboundedSender<String>,
    attached: &mut Option<Arc<Room>>,
    msg: ClientMessage,
) {
    let result = match msg {
        ClientMessage::JoinRoom { code } => {
            join_room(state, user, session_id, tx, attached, &code)
        }
        ClientMessage::StartGame => match attached {
            Some(room) => room.start(user.user_id),
            None => Err(BattleError::NotInRoom),
        },
        ClientMessage::SubmitScore { score } => match attached {
            Some(room) => room.submit_score(user.user_id, score),
            None => Err(BattleError::NotInRoom),
        },
    };
    if let Err(err) = result {
        dispatch::send_to(
            tx,
            &ServerMessage::Error {
                message: err.to_string(),
            },
        );
    }
}

fn join_room(
    state: &AppState,
    user: &UserIdentity,
    session_id: Uuid,
    tx: &UnboundedSender<String>,
    attached: &mut Option<Arc<Room>>,
    code: &str,
) -> Result<(), BattleError> {
    // One room per session; no implicit leave-then-join.
    if attached.is_some() {
        return Err(BattleError::AlreadyInRoom);
    }
    let room = state.rooms.get(code).ok_or(BattleError::RoomNotFound)?;
    room.join(session_id, user, tx.clone())?;
    *attached = Some(room);
    Ok(())
}
