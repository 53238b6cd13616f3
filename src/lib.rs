//! Real-time "Kana Battle" room coordination for haiji.
//!
//! Players join a coded room over one WebSocket each, the host starts a
//! timed typing contest, every accepted answer bumps a live score broadcast
//! to the whole room, and a competition ranking is computed when the clock
//! runs out. State is in-memory only; a restart drops all in-flight rooms.

pub mod auth;
pub mod config;
pub mod http;
pub mod kana;
pub mod room;
pub mod telemetry;
pub mod util;
pub mod ws;
