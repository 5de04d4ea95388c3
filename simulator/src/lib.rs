// Dev/test feed server: pushes synthetic bus telemetry over a WebSocket
// and carries the sensor client's little ingest/history HTTP API, so the
// dashboard can be driven without any hardware on the bench.

pub mod feed;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;

use buswatch_shared::TelemetryRecord;

/// Bounded in-memory history of recent readings.
pub struct Storage {
    max: usize,
    data: VecDeque<TelemetryRecord>,
}

impl Storage {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            data: VecDeque::with_capacity(max),
        }
    }

    pub fn add(&mut self, rec: TelemetryRecord) {
        if self.data.len() == self.max {
            self.data.pop_front();
        }
        self.data.push_back(rec);
    }

    pub fn all(&self) -> Vec<TelemetryRecord> {
        self.data.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Pre-serialized JSON frames fanned out to WebSocket subscribers.
    pub frames_tx: broadcast::Sender<String>,
    pub history: Arc<Mutex<Storage>>,
}

impl AppState {
    pub fn new(history_max: usize) -> Self {
        Self {
            frames_tx: broadcast::channel(512).0,
            history: Arc::new(Mutex::new(Storage::new(history_max))),
        }
    }

    /// Store one record and push it to every connected dashboard.
    pub fn publish(&self, rec: TelemetryRecord) {
        let frame = match serde_json::to_string(&rec) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode record");
                return;
            }
        };
        if let Ok(mut history) = self.history.lock() {
            history.add(rec);
        }
        let _ = self.frames_tx.send(frame);
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(get_data).post(post_data))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[derive(Serialize)]
struct DataResponse {
    values: Vec<TelemetryRecord>,
}

#[derive(Serialize)]
struct StatusOk {
    status: &'static str,
}

async fn get_data(State(state): State<AppState>) -> impl IntoResponse {
    let values = state.history.lock().map(|h| h.all()).unwrap_or_default();
    Json(DataResponse { values })
}

async fn post_data(
    State(state): State<AppState>,
    Json(rec): Json<TelemetryRecord>,
) -> impl IntoResponse {
    state.publish(rec);
    Json(StatusOk { status: "ok" })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(socket: WebSocket, state: AppState) {
    let mut frames_rx = state.frames_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    // Task: server -> client
    let send_task = async move {
        loop {
            match frames_rx.recv().await {
                Ok(frame) => {
                    if sender
                        .send(Message::Text(Utf8Bytes::from(frame)))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // A slow client just skips to the newest frames.
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    // Task: client -> server. Dashboards send nothing; drain until close.
    let recv_task = async move { while let Some(Ok(_)) = receiver.next().await {} };

    tokio::join!(send_task, recv_task);
}
