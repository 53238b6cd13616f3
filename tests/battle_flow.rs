//! End-to-end battle flow against a real listening server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use haiji_battle::auth::{TokenSigner, UserIdentity};
use haiji_battle::http::{self, routes::AppState};
use haiji_battle::room::manager::RoomManager;
use haiji_battle::room::state::RoomConfig;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const KEY: [u8; 32] = [7u8; 32];

fn identity(name: &str) -> UserIdentity {
    UserIdentity {
        user_id: Uuid::new_v4(),
        username: name.to_string(),
    }
}

fn state() -> AppState {
    AppState {
        rooms: Arc::new(RoomManager::new()),
        auth: TokenSigner::new(KEY),
    }
}

async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = http::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, token: &str) -> Socket {
    let url = format!("ws://{addr}/ws?token={token}");
    let (socket, _) = connect_async(url).await.expect("websocket upgrade");
    socket
}

async fn send(socket: &mut Socket, msg: Value) {
    socket
        .send(Message::Text(msg.to_string()))
        .await
        .expect("send");
}

/// Read frames until one with the wanted `type` arrives, skipping others.
async fn next_of_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), socket.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {kind}"))
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(&text).unwrap();
            if value["type"] == kind {
                return value;
            }
        }
    }
}

#[tokio::test]
async fn create_room_endpoint_authenticates_and_validates() {
    let state = state();
    let signer = state.auth.clone();
    let addr = spawn_server(state).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/api/kana-battle");
    let token = signer.issue(&identity("ana")).unwrap();

    // No credential.
    let resp = client
        .post(&url)
        .json(&json!({"duration": 60, "groups": ["hsingle"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Bad duration.
    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({"duration": 5, "groups": ["hsingle"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Unknown groups only.
    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({"duration": 60, "groups": ["nope"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Valid request yields a six-character code.
    let resp = client
        .post(&url)
        .bearer_auth(&token)
        .json(&json!({"duration": 30, "groups": ["hsingle"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let code = body["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn websocket_upgrade_requires_a_valid_token() {
    let addr = spawn_server(state()).await;
    let url = format!("ws://{addr}/ws?token=forged");
    assert!(connect_async(url).await.is_err());
}

#[tokio::test]
async fn full_battle_flow() {
    let state = state();
    let signer = state.auth.clone();
    let rooms = Arc::clone(&state.rooms);
    let addr = spawn_server(state).await;

    let ana = identity("ana");
    let ben = identity("ben");

    // Short round so the clock fires within the test. Created through the
    // registry, which does not impose the HTTP layer's 30-second floor.
    let room = rooms.create_room(
        &ana,
        RoomConfig {
            duration_secs: 1,
            groups: vec!["hsingle".to_string()],
        },
    );
    let code = room.code.clone();
    drop(room);

    let mut ana_ws = connect(addr, &signer.issue(&ana).unwrap()).await;
    let mut ben_ws = connect(addr, &signer.issue(&ben).unwrap()).await;

    // Unknown room code is an error; the connection stays open.
    send(&mut ana_ws, json!({"type": "JOIN_ROOM", "code": "ZZZZZZ"})).await;
    let err = next_of_type(&mut ana_ws, "ERROR").await;
    assert_eq!(err["message"], "room not found");

    // Host joins.
    send(&mut ana_ws, json!({"type": "JOIN_ROOM", "code": code.as_str()})).await;
    let lobby = next_of_type(&mut ana_ws, "ROOM_STATE").await;
    assert_eq!(lobby["state"], "WAITING");
    assert_eq!(lobby["hostId"], ana.user_id.to_string());
    assert!(lobby["players"][ana.user_id.to_string()].is_object());

    // Guests cannot start the game.
    send(&mut ben_ws, json!({"type": "START_GAME"})).await;
    let err = next_of_type(&mut ben_ws, "ERROR").await;
    assert_eq!(err["message"], "not in a room");

    send(&mut ben_ws, json!({"type": "JOIN_ROOM", "code": code.as_str()})).await;
    let lobby = next_of_type(&mut ben_ws, "ROOM_STATE").await;
    assert_eq!(lobby["players"].as_object().unwrap().len(), 2);

    send(&mut ben_ws, json!({"type": "START_GAME"})).await;
    let err = next_of_type(&mut ben_ws, "ERROR").await;
    assert_eq!(err["message"], "only the host can start the game");

    // Garbage is answered, not fatal.
    send(&mut ana_ws, json!({"type": "DANCE"})).await;
    let err = next_of_type(&mut ana_ws, "ERROR").await;
    assert_eq!(err["message"], "unrecognized message");

    // Host starts; everyone learns the deadline.
    send(&mut ana_ws, json!({"type": "START_GAME"})).await;
    let started = next_of_type(&mut ben_ws, "GAME_STARTED").await;
    assert!(started["endTime"].is_string());
    next_of_type(&mut ana_ws, "GAME_STARTED").await;

    // One correct answer from the host.
    send(&mut ana_ws, json!({"type": "SUBMIT_SCORE", "score": 1})).await;
    let update = next_of_type(&mut ben_ws, "SCORE_UPDATE").await;
    assert_eq!(update["players"][ana.user_id.to_string()]["score"], 1);
    assert_eq!(update["players"][ben.user_id.to_string()]["score"], 0);

    // The clock fires and the final ranking comes back to both.
    let over = next_of_type(&mut ana_ws, "GAME_OVER").await;
    assert_eq!(over["players"][ana.user_id.to_string()]["rank"], 1);
    assert_eq!(over["players"][ana.user_id.to_string()]["score"], 1);
    assert_eq!(over["players"][ben.user_id.to_string()]["rank"], 2);
    next_of_type(&mut ben_ws, "GAME_OVER").await;
}
