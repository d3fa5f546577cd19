//! HTTP and WebSocket surface.
//!
//! REST endpoints serve the current analytics snapshots; the WebSocket
//! endpoint streams emitted signals. Connected clients optionally
//! drive the feed activity gate so the poller can idle when nobody is
//! watching.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::analytics::{AnalyticsSnapshot, AnalyticsStore};
use crate::types::SignalEvent;

/// Maps WebSocket client presence onto the feed activity gate. With
/// `pause_when_idle` off the gate stays open; the tracker still owns
/// the sender so the channel survives.
pub struct ActivityTracker {
    tx: watch::Sender<bool>,
    clients: AtomicUsize,
    pause_when_idle: bool,
}

impl ActivityTracker {
    pub fn new(tx: watch::Sender<bool>, pause_when_idle: bool) -> Self {
        Self {
            tx,
            clients: AtomicUsize::new(0),
            pause_when_idle,
        }
    }

    fn connected(&self) {
        let clients = self.clients.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(clients, "ws client connected");
        let _ = self.tx.send(true);
    }

    fn disconnected(&self) {
        let clients = self.clients.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(clients, "ws client disconnected");
        if self.pause_when_idle && clients == 0 {
            let _ = self.tx.send(false);
        }
    }
}

pub struct AppState {
    pub store: Arc<AnalyticsStore>,
    pub signals: broadcast::Sender<SignalEvent>,
    pub activity: ActivityTracker,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum WsMessage {
    Connected { symbols: Vec<String> },
    Signal(SignalEvent),
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/symbols", get(get_symbols))
        .route("/api/snapshot/{symbol}", get(get_snapshot))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// GET /api/symbols - tracked symbols
async fn get_symbols(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.symbols().await)
}

/// GET /api/snapshot/{symbol} - full analytics snapshot
async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<AnalyticsSnapshot>, StatusCode> {
    match state.store.snapshot(&symbol).await {
        Some(snap) => Ok(Json((*snap).clone())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    state.activity.connected();

    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.signals.subscribe();

    let welcome = WsMessage::Connected {
        symbols: state.store.symbols().await,
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    let send_task = tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&WsMessage::Signal(event)) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Drain (and ignore) client messages so pings keep flowing.
    let recv_task = tokio::spawn(async move { while receiver.next().await.is_some() {} });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.activity.disconnected();
    info!("ws client disconnected");
}
