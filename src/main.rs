use std::sync::Arc;

use tracing::info;

use haiji_battle::auth::TokenSigner;
use haiji_battle::http::{self, routes::AppState};
use haiji_battle::room::manager::RoomManager;
use haiji_battle::{config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let state = AppState {
        rooms: Arc::new(RoomManager::new()),
        auth: TokenSigner::new(config::hmac_key()),
    };

    // Background sweeper: reclaims finished and abandoned rooms.
    {
        let rooms = Arc::clone(&state.rooms);
        let grace = config::room_grace();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(config::SWEEP_INTERVAL);
            loop {
                tick.tick().await;
                rooms.sweep(grace);
            }
        });
    }

    let app = http::router(state);
    let addr = config::server_addr();
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
