//! Registry of live rooms.
//!
//! The one piece of global mutable state: a concurrent code → room map.
//! Lookups vastly outnumber create/remove, which is what `DashMap` is for.
//! The registry is an owned value injected into the handler state, never a
//! module-global, so tests can run isolated instances side by side.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::auth::UserIdentity;
use crate::room::state::{Room, RoomConfig};
use crate::util::id::new_room_code;

#[derive(Default)]
pub struct RoomManager {
    rooms: DashMap<String, Arc<Room>>,
}

impl RoomManager {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Create a room in WAITING with `host` as its sole initial player and
    /// return it. Codes are regenerated until one not currently live is
    /// found; the entry API makes the check-and-insert atomic, so a code is
    /// never handed out twice.
    pub fn create_room(&self, host: &UserIdentity, config: RoomConfig) -> Arc<Room> {
        loop {
            let code = new_room_code();
            match self.rooms.entry(code) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let room = Arc::new(Room::new(slot.key().clone(), host, config));
                    slot.insert(Arc::clone(&room));
                    info!(code = %room.code, host = %host.username, "room created");
                    break room;
                }
            }
        }
    }

    /// Look up a room by code, case-insensitively.
    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        let code = code.to_ascii_uppercase();
        self.rooms.get(code.as_str()).map(|r| Arc::clone(&r))
    }

    /// Remove the room if it can no longer progress (FINISHED with nobody
    /// attached). Called on every detach.
    pub fn reap(&self, code: &str) {
        if let Some((code, _room)) = self.rooms.remove_if(code, |_, room| room.is_dead()) {
            debug!(%code, "room reaped");
        }
    }

    /// Periodic cleanup: drops finished-and-empty rooms plus rooms that have
    /// sat without a single session past `grace` (players never connected,
    /// or all vanished). Torn-down rooms get their game clock disarmed.
    pub fn sweep(&self, grace: Duration) {
        let before = self.rooms.len();
        self.rooms.retain(|_, room| {
            let expired = room.is_dead() || room.is_idle(grace);
            if expired {
                room.shutdown();
            }
            !expired
        });
        let swept = before.saturating_sub(self.rooms.len());
        if swept > 0 {
            debug!(swept, remaining = self.rooms.len(), "swept rooms");
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
