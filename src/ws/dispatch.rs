//! Serialize-once broadcast fan-out.

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::ws::protocol::ServerMessage;

/// Send `msg` to every target session.
///
/// The message is serialized exactly once. Each session owns an unbounded
/// outbound queue drained by its own writer task, so a slow or half-closed
/// connection cannot stall delivery to the rest of the room. A failed send
/// means that session is already tearing down and is simply skipped.
pub fn fan_out(targets: &[UnboundedSender<String>], msg: &ServerMessage) {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(err) => {
            warn!(%err, "dropping unserializable broadcast");
            return;
        }
    };
    for tx in targets {
        let _ = tx.send(text.clone());
    }
}

/// Reply to a single session.
pub fn send_to(tx: &UnboundedSender<String>, msg: &ServerMessage) {
    fan_out(std::slice::from_ref(tx), msg);
}
