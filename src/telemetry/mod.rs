//! Tracing initialization.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber with env-driven filtering.
///
/// Configure via RUST_LOG, e.g.:
/// RUST_LOG=debug,tower_http=info
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,axum=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
