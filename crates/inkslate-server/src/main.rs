//! Inkslate Board Server
//!
//! Stores boards and relays live edits between clients viewing the same board.
//!
//! ## Endpoints
//!
//! - `GET /api/boards/{id}`: stored shape records (`[]` if none)
//! - `PUT /api/boards/{id}`: replace the records with the JSON array body
//! - `POST /api/boards/{id}/thumbnail`: store raw image bytes, reply `{ "url": ... }`
//! - `GET /api/boards/{id}/thumbnail`: the stored image
//! - `GET /ws/{id}`: live sync
//!
//! ## Live-sync protocol
//!
//! ```json
//! { "type": "join", "board": "board-id" }
//! { "type": "shapes", "shapes": [ ... ] }
//! ```
//! Every `shapes` message is persisted as the board's new state and relayed
//! to the other peers on the board, never back to the sender.

mod relay;
mod store;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use inkslate_core::sync::{ClientMessage, ServerMessage};
use relay::Rooms;
use serde_json::{Value, json};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use store::BoardStore;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_ADDR: &str = "0.0.0.0:3030";
/// Boards and thumbnails can exceed axum's default 2 MB body limit.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Settings read from the environment.
#[derive(Debug, Clone)]
struct ServerConfig {
    addr: SocketAddr,
    data_dir: Option<PathBuf>,
    public_url: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        let addr = std::env::var("INKSLATE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr = addr.parse().unwrap_or_else(|e| {
            warn!("Invalid INKSLATE_ADDR {:?} ({}), using {}", addr, e, DEFAULT_ADDR);
            SocketAddr::from(([0, 0, 0, 0], 3030))
        });
        let data_dir = std::env::var_os("INKSLATE_DATA_DIR").map(PathBuf::from);
        let public_url = std::env::var("INKSLATE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", addr.port()));
        Self {
            addr,
            data_dir,
            public_url,
        }
    }
}

/// Shared application state
struct AppState {
    store: BoardStore,
    rooms: Rooms,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkslate_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    let store = match &config.data_dir {
        Some(dir) => {
            info!("Storing boards in {}", dir.display());
            BoardStore::on_disk(dir, &config.public_url)
        }
        None => {
            info!("No INKSLATE_DATA_DIR set; boards are kept in memory");
            BoardStore::in_memory(&config.public_url)
        }
    };
    let state = Arc::new(AppState {
        store,
        rooms: Rooms::new(),
    });

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };
    info!("Inkslate server listening on {}", config.addr);
    if let Err(e) = axum::serve(listener, app(state)).await {
        error!("Server error: {}", e);
    }
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/boards/{id}", get(load_board).put(save_board))
        .route("/api/boards/{id}/thumbnail", get(get_thumbnail).post(upload_thumbnail))
        .route("/ws/{id}", get(ws_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn load_board(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Json<Vec<Value>> {
    Json(state.store.load(&id).await)
}

async fn save_board(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(records): Json<Vec<Value>>,
) -> impl IntoResponse {
    match state.store.save(&id, records).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(e) => {
            warn!("Save of board {} failed: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}

async fn upload_thumbnail(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "empty image" })));
    }
    match state.store.store_thumbnail(&id, body).await {
        Ok(url) => (StatusCode::OK, Json(json!({ "url": url }))),
        Err(e) => {
            warn!("Thumbnail upload for {} failed: {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
        }
    }
}

async fn get_thumbnail(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.thumbnail(&id).await {
        Some(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, id))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            error!("Failed to encode server message: {}", e);
            None
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, board: String) {
    let peer_id = Uuid::new_v4().to_string();
    info!("Peer {} connected to board {}", peer_id, board);

    let (mut sender, mut receiver) = socket.split();
    let mut room_rx = state.rooms.join(&board, &peer_id);
    state.rooms.broadcast(
        &board,
        &peer_id,
        ServerMessage::PeerJoined {
            peer_id: peer_id.clone(),
        },
    );

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Join { board: requested }) => {
                                if requested != board {
                                    warn!("Peer {} asked for board {} on the {} channel", peer_id, requested, board);
                                    let err = ServerMessage::Error {
                                        message: format!("this channel serves board {}", board),
                                    };
                                    if let Some(reply) = encode(&err) {
                                        if sender.send(reply).await.is_err() {
                                            break;
                                        }
                                    }
                                }
                            }
                            Ok(ClientMessage::Shapes { shapes }) => {
                                if let Err(e) = state.store.save(&board, shapes.clone()).await {
                                    warn!("Failed to persist live edit on {}: {}", board, e);
                                }
                                state.rooms.broadcast(&board, &peer_id, ServerMessage::Shapes { shapes });
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", peer_id, e);
                                let err = ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                };
                                if let Some(reply) = encode(&err) {
                                    let _ = sender.send(reply).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", peer_id, e);
                        break;
                    }
                }
            }

            msg = room_rx.recv() => {
                match msg {
                    // Don't echo back to sender
                    Ok((from, _)) if from == peer_id => {}
                    Ok((_, server_msg)) => {
                        if let Some(out) = encode(&server_msg) {
                            if sender.send(out).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Peer {} lagged behind by {} messages", peer_id, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    state.rooms.leave(&board, &peer_id);
    state.rooms.broadcast(
        &board,
        &peer_id,
        ServerMessage::PeerLeft {
            peer_id: peer_id.clone(),
        },
    );
    info!("Peer {} disconnected from board {}", peer_id, board);
}
