use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use buswatch_shared::TelemetryRecord;
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

/// Connection lifecycle as seen by status displays.
///
/// Owned exclusively by the ingress task; observers read it through a
/// watch handle. `Failed` means a connection attempt never completed the
/// handshake, `Disconnected` means an established session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Failed => "Failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconnect policy: delay = min(base * 2^attempts, max) + jitter,
/// jitter drawn uniformly from [0, jitter_max).
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    pub base: Duration,
    pub max: Duration,
    pub jitter_max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
            jitter_max: Duration::from_millis(1000),
        }
    }
}

/// Base reconnect delay for the given attempt count, jitter excluded.
pub fn backoff_delay(cfg: &BackoffConfig, attempts: u32) -> Duration {
    let base_ms = cfg.base.as_millis() as u64;
    let max_ms = cfg.max.as_millis() as u64;
    let scaled = match 1u64.checked_shl(attempts) {
        Some(factor) => base_ms.saturating_mul(factor),
        None => u64::MAX,
    };
    Duration::from_millis(scaled.min(max_ms))
}

fn jitter(cfg: &BackoffConfig) -> Duration {
    use rand::RngExt;
    let max_ms = cfg.jitter_max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..max_ms))
}

#[derive(Debug, Clone)]
pub struct IngressConfig {
    pub endpoint: String,
    pub backoff: BackoffConfig,
}

/// Handle to a running ingress supervisor.
pub struct IngressHandle {
    alive: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl IngressHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Stop reconnecting and tear the connection task down.
    pub fn shutdown(self) {
        self.alive.store(false, Ordering::Relaxed);
        self.task.abort();
    }
}

/// Spawn the ingress supervisor: it owns the socket, parses inbound JSON
/// frames into `record_tx`, and reconnects after every drop.
pub fn spawn(cfg: IngressConfig, record_tx: mpsc::Sender<TelemetryRecord>) -> IngressHandle {
    let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
    let alive = Arc::new(AtomicBool::new(true));
    let task = tokio::spawn(supervisor(cfg, record_tx, state_tx, alive.clone()));
    IngressHandle {
        alive,
        task,
        state_rx,
    }
}

async fn supervisor(
    cfg: IngressConfig,
    record_tx: mpsc::Sender<TelemetryRecord>,
    state_tx: watch::Sender<ConnectionState>,
    alive: Arc<AtomicBool>,
) {
    // No retry cap: a wall-mounted dashboard should keep trying for as
    // long as it is on screen. Bound `attempts` here if that ever changes.
    let mut attempts: u32 = 0;

    while alive.load(Ordering::Relaxed) && !record_tx.is_closed() {
        let _ = state_tx.send(ConnectionState::Connecting);

        match connect_once(&cfg.endpoint, &record_tx, &state_tx, &mut attempts, &alive).await {
            Ok(()) => {
                let _ = state_tx.send(ConnectionState::Disconnected);
                tracing::info!(endpoint = %cfg.endpoint, "connection closed");
            }
            Err(e) => {
                let _ = state_tx.send(ConnectionState::Failed);
                tracing::warn!(endpoint = %cfg.endpoint, error = %e, "connect failed");
            }
        }

        if !alive.load(Ordering::Relaxed) || record_tx.is_closed() {
            break;
        }

        let delay = backoff_delay(&cfg.backoff, attempts) + jitter(&cfg.backoff);
        attempts = attempts.saturating_add(1);
        tracing::info!(
            attempt = attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnecting after backoff"
        );
        tokio::time::sleep(delay).await;
    }
}

/// One connection lifetime: handshake, then read frames until the stream
/// ends. Returns Ok(()) for a session that was established and later
/// dropped, Err for a handshake that never completed.
async fn connect_once(
    endpoint: &str,
    record_tx: &mpsc::Sender<TelemetryRecord>,
    state_tx: &watch::Sender<ConnectionState>,
    attempts: &mut u32,
    alive: &Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(endpoint)
        .await
        .context("websocket handshake")?;

    let _ = state_tx.send(ConnectionState::Connected);
    *attempts = 0; // back to the base delay after any successful session
    tracing::info!(endpoint, "connected");

    // The dashboard never sends application frames; hold the write half so
    // the transport can still flush control responses.
    let (_write, mut read) = ws_stream.split();

    while alive.load(Ordering::Relaxed) {
        let Some(item) = read.next().await else { break };

        let msg = match item {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "read error");
                break;
            }
        };

        // Binary/ping/pong/close frames never reach the parser.
        if let Message::Text(text) = msg {
            match serde_json::from_str::<TelemetryRecord>(&text) {
                Ok(rec) => {
                    if record_tx.send(rec).await.is_err() {
                        // Consumer gone: treat as a normal session end.
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping malformed telemetry frame");
                }
            }
        }
    }

    Ok(())
}
