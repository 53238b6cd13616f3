//! Configuration from the environment (ports, keys, sweep tuning).

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use rand::RngCore;

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// HMAC key for bearer tokens: `HAIJI_HMAC_KEY` as 64 hex chars, otherwise
/// an ephemeral random key (existing tokens then die with the process).
pub fn hmac_key() -> [u8; 32] {
    env::var("HAIJI_HMAC_KEY")
        .ok()
        .and_then(|hex| hex::decode(hex).ok())
        .and_then(|bytes| bytes.try_into().ok())
        .unwrap_or_else(|| {
            let mut key = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut key);
            key
        })
}

/// How long a room may sit with no sessions before the sweeper reclaims it
/// (`HAIJI_ROOM_GRACE_SECS`, default 30).
pub fn room_grace() -> Duration {
    let secs = env::var("HAIJI_ROOM_GRACE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    Duration::from_secs(secs)
}

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);
