//! HTTP surface: room creation and health.
//!
//! Room creation front-loads the registry; everything after the returned
//! code happens over the battle socket.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{TokenSigner, UserIdentity};
use crate::kana;
use crate::room::manager::RoomManager;
use crate::room::state::RoomConfig;
use crate::room::BattleError;

/// Shared application state, injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub auth: TokenSigner,
}

pub const MIN_DURATION_SECS: u64 = 30;
pub const MAX_DURATION_SECS: u64 = 600;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub duration: u64,
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn create_room(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, (StatusCode, String)> {
    let host = authenticate(&state.auth, &headers)?;
    validate_config(&req).map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    let room = state.rooms.create_room(
        &host,
        RoomConfig {
            duration_secs: req.duration,
            groups: req.groups,
        },
    );
    Ok(Json(CreateRoomResponse {
        code: room.code.clone(),
    }))
}

fn authenticate(
    auth: &TokenSigner,
    headers: &HeaderMap,
) -> Result<UserIdentity, (StatusCode, String)> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            BattleError::Unauthenticated.to_string(),
        )
    };
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    auth.verify(token).map_err(|_| unauthorized())
}

/// Configuration is vetted here, before any room exists.
fn validate_config(req: &CreateRoomRequest) -> Result<(), BattleError> {
    if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&req.duration) {
        return Err(BattleError::InvalidConfig(format!(
            "duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds"
        )));
    }
    if req.groups.is_empty() {
        return Err(BattleError::InvalidConfig(
            "at least one kana group is required".into(),
        ));
    }
    if kana::pool_size(&req.groups) == 0 {
        return Err(BattleError::InvalidConfig(
            "selected groups have no prompts".into(),
        ));
    }
    Ok(())
}
