//! Battle rooms: the per-room state machine, the room registry, and the
//! final-ranking computation.

pub mod manager;
pub mod ranking;
pub mod state;

/// Recoverable protocol/domain failures. Each is reported only to the
/// offending connection as an `ERROR` message and never mutates room state.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BattleError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("room not found")]
    RoomNotFound,
    #[error("only the host can start the game")]
    NotAuthorized,
    #[error("need at least two players to start")]
    NotEnoughPlayers,
    #[error("already in a room")]
    AlreadyInRoom,
    #[error("not in a room")]
    NotInRoom,
    #[error("game already in progress")]
    RoomLocked,
    #[error("unrecognized message")]
    UnknownMessage,
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
    #[error("score out of sequence")]
    InvalidScore,
}
