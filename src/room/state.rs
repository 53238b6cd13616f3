//! The battle-room state machine.
//!
//! One `Room` is one battle instance. All mutation happens under the room's
//! mutex; broadcasts are fanned out after the lock is released, from a
//! snapshot of the attached sessions' sender handles, so no socket I/O ever
//! runs while the room is locked.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::room::{ranking, BattleError};
use crate::ws::dispatch;
use crate::ws::protocol::{ConfigView, PlayerView, ServerMessage};

/// Room lifecycle. Transitions are one-directional:
/// WAITING → PLAYING → FINISHED, with no regression. A finished room is
/// terminal; playing again means creating a fresh room under a new code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Waiting,
    Playing,
    Finished,
}

/// Game settings, fixed by the host at creation.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub duration_secs: u64,
    pub groups: Vec<String>,
}

/// Per-room player record. Created on first join, survives disconnects, and
/// lives until the room itself is destroyed.
#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: Uuid,
    pub username: String,
    pub score: u32,
    /// Join sequence; gives the stable ordering among tied scores.
    joined: u32,
}

struct RoomInner {
    phase: Phase,
    players: HashMap<Uuid, Player>,
    /// Live connections, keyed by session id. Each holds the sending half of
    /// that session's outbound queue.
    sessions: HashMap<Uuid, UnboundedSender<String>>,
    started_at: Option<OffsetDateTime>,
    ends_at: Option<OffsetDateTime>,
    next_seq: u32,
    idle_since: Option<Instant>,
    clock: Option<JoinHandle<()>>,
}

pub struct Room {
    pub code: String,
    pub host_id: Uuid,
    pub config: RoomConfig,
    pub created_at: OffsetDateTime,
    inner: Mutex<RoomInner>,
}

/// Point-in-time copy of a room's mutable state, for inspection.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub phase: Phase,
    pub players: HashMap<Uuid, Player>,
    pub sessions: usize,
    pub started_at: Option<OffsetDateTime>,
    pub ends_at: Option<OffsetDateTime>,
}

impl Room {
    /// A new room in WAITING with `host` as its sole initial player.
    pub fn new(code: String, host: &UserIdentity, config: RoomConfig) -> Self {
        let mut players = HashMap::new();
        players.insert(
            host.user_id,
            Player {
                user_id: host.user_id,
                username: host.username.clone(),
                score: 0,
                joined: 0,
            },
        );
        Self {
            code,
            host_id: host.user_id,
            config,
            created_at: OffsetDateTime::now_utc(),
            inner: Mutex::new(RoomInner {
                phase: Phase::Waiting,
                players,
                sessions: HashMap::new(),
                started_at: None,
                ends_at: None,
                next_seq: 1,
                idle_since: Some(Instant::now()),
                clock: None,
            }),
        }
    }

    /// Attach a session and upsert its player, then broadcast `ROOM_STATE`.
    ///
    /// While WAITING any user may join. Once the round has started only users
    /// already in the player table may re-attach (reconnect-by-identity,
    /// score intact); anyone else is turned away with `RoomLocked`.
    pub fn join(
        &self,
        session_id: Uuid,
        user: &UserIdentity,
        tx: UnboundedSender<String>,
    ) -> Result<(), BattleError> {
        let (msg, targets) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.phase != Phase::Waiting && !inner.players.contains_key(&user.user_id) {
                return Err(BattleError::RoomLocked);
            }
            if let Some(player) = inner.players.get_mut(&user.user_id) {
                player.username = user.username.clone();
            } else {
                let joined = inner.next_seq;
                inner.next_seq += 1;
                inner.players.insert(
                    user.user_id,
                    Player {
                        user_id: user.user_id,
                        username: user.username.clone(),
                        score: 0,
                        joined,
                    },
                );
            }
            inner.sessions.insert(session_id, tx);
            inner.idle_since = None;
            (self.room_state(inner), sender_snapshot(inner))
        };
        dispatch::fan_out(&targets, &msg);
        info!(code = %self.code, user = %user.username, "player joined");
        Ok(())
    }

    /// Drop a session. The player record and score stay; remaining members
    /// get a fresh `ROOM_STATE` so lobbies can show presence.
    pub fn detach(&self, session_id: Uuid) {
        let (msg, targets) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.sessions.remove(&session_id).is_none() {
                return;
            }
            if inner.sessions.is_empty() {
                inner.idle_since = Some(Instant::now());
            }
            (self.room_state(inner), sender_snapshot(inner))
        };
        dispatch::fan_out(&targets, &msg);
        debug!(code = %self.code, "session detached");
    }

    /// Host-only transition WAITING → PLAYING: reset scores, stamp the round
    /// window, arm the game clock, broadcast `GAME_STARTED`.
    ///
    /// A start request against a room that already left WAITING is dropped
    /// without effect.
    pub fn start(self: &Arc<Self>, requester: Uuid) -> Result<(), BattleError> {
        let (msg, targets) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if requester != self.host_id {
                return Err(BattleError::NotAuthorized);
            }
            if inner.players.len() < 2 {
                return Err(BattleError::NotEnoughPlayers);
            }
            if inner.phase != Phase::Waiting {
                return Ok(());
            }
            inner.phase = Phase::Playing;
            for player in inner.players.values_mut() {
                player.score = 0;
            }
            let started = OffsetDateTime::now_utc();
            let ends = started + time::Duration::seconds(self.config.duration_secs as i64);
            inner.started_at = Some(started);
            inner.ends_at = Some(ends);

            let room = Arc::clone(self);
            let duration = std::time::Duration::from_secs(self.config.duration_secs);
            inner.clock = Some(tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                room.finish();
            }));

            (ServerMessage::GameStarted { end_time: ends }, sender_snapshot(inner))
        };
        dispatch::fan_out(&targets, &msg);
        info!(code = %self.code, duration = self.config.duration_secs, "game started");
        Ok(())
    }

    /// Record a score submission and broadcast the updated table.
    ///
    /// The client reports its new total; it is accepted only as the exact
    /// monotonic successor of the stored score. Submissions outside PLAYING
    /// are dropped without effect; the clock-driven FINISHED transition is
    /// the only cutoff.
    pub fn submit_score(&self, user_id: Uuid, score: u32) -> Result<(), BattleError> {
        let (msg, targets) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.phase != Phase::Playing {
                return Ok(());
            }
            let player = inner.players.get_mut(&user_id).ok_or(BattleError::NotInRoom)?;
            if score != player.score + 1 {
                return Err(BattleError::InvalidScore);
            }
            player.score = score;
            (
                ServerMessage::ScoreUpdate {
                    players: player_views(inner, None),
                },
                sender_snapshot(inner),
            )
        };
        dispatch::fan_out(&targets, &msg);
        Ok(())
    }

    /// PLAYING → FINISHED: compute the final ranking and broadcast
    /// `GAME_OVER`. Idempotent: the clock firing and any later check both
    /// funnel through here, and only the first caller transitions.
    pub(crate) fn finish(&self) {
        let (msg, targets) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.phase != Phase::Playing {
                return;
            }
            inner.phase = Phase::Finished;
            inner.clock = None;
            let standings = join_ordered_standings(inner);
            let ranks = ranking::competition_ranks(&standings);
            (
                ServerMessage::GameOver {
                    players: player_views(inner, Some(&ranks)),
                },
                sender_snapshot(inner),
            )
        };
        dispatch::fan_out(&targets, &msg);
        info!(code = %self.code, "game over");
    }

    /// Abnormal teardown: disarm the game clock so it cannot fire against a
    /// room that is being destroyed.
    pub fn shutdown(&self) {
        let clock = self.inner.lock().clock.take();
        if let Some(handle) = clock {
            handle.abort();
        }
    }

    /// Finished with nobody attached: eligible for immediate removal.
    pub fn is_dead(&self) -> bool {
        let inner = self.inner.lock();
        inner.phase == Phase::Finished && inner.sessions.is_empty()
    }

    /// No sessions for at least `grace`: eligible for sweep regardless of
    /// phase (covers rooms whose players never connected or all vanished).
    pub fn is_idle(&self, grace: std::time::Duration) -> bool {
        let inner = self.inner.lock();
        inner.sessions.is_empty()
            && inner
                .idle_since
                .map(|since| since.elapsed() >= grace)
                .unwrap_or(false)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let inner = self.inner.lock();
        RoomSnapshot {
            phase: inner.phase,
            players: inner.players.clone(),
            sessions: inner.sessions.len(),
            started_at: inner.started_at,
            ends_at: inner.ends_at,
        }
    }

    fn room_state(&self, inner: &RoomInner) -> ServerMessage {
        ServerMessage::RoomState {
            state: inner.phase,
            players: player_views(inner, None),
            config: ConfigView {
                duration: self.config.duration_secs,
                groups: self.config.groups.clone(),
            },
            host_id: self.host_id,
        }
    }
}

fn sender_snapshot(inner: &RoomInner) -> Vec<UnboundedSender<String>> {
    inner.sessions.values().cloned().collect()
}

fn player_views(
    inner: &RoomInner,
    ranks: Option<&HashMap<Uuid, u32>>,
) -> HashMap<Uuid, PlayerView> {
    inner
        .players
        .values()
        .map(|p| {
            (
                p.user_id,
                PlayerView {
                    user_id: p.user_id,
                    username: p.username.clone(),
                    score: p.score,
                    rank: ranks.and_then(|r| r.get(&p.user_id).copied()),
                },
            )
        })
        .collect()
}

fn join_ordered_standings(inner: &RoomInner) -> Vec<(Uuid, u32)> {
    let mut players: Vec<&Player> = inner.players.values().collect();
    players.sort_by_key(|p| p.joined);
    players.iter().map(|p| (p.user_id, p.score)).collect()
}
