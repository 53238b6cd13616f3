//! Wire protocol for the battle socket.
//!
//! JSON envelopes tagged by `type`, e.g. `{"type":"JOIN_ROOM","code":"AB12CD"}`.
//! Field names are camelCase to match the web client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::room::state::Phase;

/// Messages a client may send after the connection is established.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    JoinRoom { code: String },
    StartGame,
    SubmitScore { score: u32 },
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    Error {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    RoomState {
        state: Phase,
        players: HashMap<Uuid, PlayerView>,
        config: ConfigView,
        host_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    GameStarted {
        #[serde(with = "time::serde::rfc3339")]
        end_time: OffsetDateTime,
    },
    ScoreUpdate {
        players: HashMap<Uuid, PlayerView>,
    },
    GameOver {
        players: HashMap<Uuid, PlayerView>,
    },
}

/// One row of the player table as clients see it. `rank` is present only in
/// `GAME_OVER`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: Uuid,
    pub username: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

/// Room settings as broadcast in `ROOM_STATE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigView {
    pub duration: u64,
    pub groups: Vec<String>,
}
