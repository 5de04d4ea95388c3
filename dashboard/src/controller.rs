use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use buswatch_shared::TelemetryRecord;

use crate::coalescer::Coalescer;
use crate::config::DashboardConfig;
use crate::ingress::{self, ConnectionState, IngressConfig};
use crate::series::{ChartMetric, SeriesBank};
use crate::sink::{RenderSink, StatusSink};

/// The dashboard context object: owns the series bank, the coalescer, the
/// sequence counter, and both sinks. Everything that used to be a loose
/// top-level variable in the sensor firmware's web page lives here.
pub struct Controller<R, S> {
    cfg: DashboardConfig,
    bank: SeriesBank,
    coalescer: Coalescer,
    seq: u64,
    render: R,
    status: S,
}

impl<R: RenderSink, S: StatusSink> Controller<R, S> {
    pub fn new(cfg: DashboardConfig, render: R, status: S) -> Self {
        let bank = SeriesBank::new(cfg.chart_points);
        Self {
            cfg,
            bank,
            coalescer: Coalescer::new(),
            seq: 0,
            render,
            status,
        }
    }

    /// Drive the pipeline: records in, throttled render passes out,
    /// connection-state changes to the status sink. Returns when the
    /// record channel closes.
    pub async fn run(
        mut self,
        mut records: mpsc::Receiver<TelemetryRecord>,
        mut state_rx: watch::Receiver<ConnectionState>,
    ) {
        self.status
            .connection_state_changed(*state_rx.borrow_and_update());

        // The single pending throttle deadline. Re-arming overwrites it,
        // which drops the stale sleep instead of stacking a second timer.
        let mut deadline: Option<Instant> = None;
        let mut state_open = true;

        loop {
            tokio::select! {
                rec = records.recv() => {
                    let Some(rec) = rec else { break };
                    if self.coalescer.submit(rec) {
                        deadline = Some(Instant::now() + self.cfg.update_throttle);
                    }
                }

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() =>
                {
                    deadline = None;
                    if let Some(rec) = self.coalescer.fire() {
                        // Hand the rest of the turn back to the runtime
                        // before touching the sinks, so a render lands on
                        // a fresh scheduling slot instead of mid-batch.
                        tokio::task::yield_now().await;

                        self.seq += 1;
                        self.bank.append_record(self.seq, &rec);
                        if let Err(e) = self.render_pass(&rec) {
                            tracing::warn!(error = ?e, seq = self.seq, "render sink failed; continuing");
                        }
                        self.coalescer.render_done();
                    }
                }

                changed = state_rx.changed(), if state_open => {
                    match changed {
                        Ok(()) => {
                            self.status
                                .connection_state_changed(*state_rx.borrow_and_update());
                        }
                        Err(_) => state_open = false,
                    }
                }
            }
        }
    }

    fn render_pass(&mut self, rec: &TelemetryRecord) -> anyhow::Result<()> {
        self.render.render_live_values(rec)?;
        for metric in ChartMetric::ALL {
            self.render.render_series(metric, self.bank.snapshot(metric))?;
        }
        self.render.render_history_row(rec, self.seq)
    }
}

/// Wire the full pipeline: ingress supervisor plus controller loop.
/// Runs until the ingress is torn down externally.
pub async fn run_dashboard(
    cfg: DashboardConfig,
    render: impl RenderSink,
    status: impl StatusSink,
) {
    let (record_tx, record_rx) = mpsc::channel(256);
    let ingress = ingress::spawn(
        IngressConfig {
            endpoint: cfg.endpoint.clone(),
            backoff: cfg.reconnect.clone(),
        },
        record_tx,
    );
    let state_rx = ingress.state_watch();

    Controller::new(cfg, render, status).run(record_rx, state_rx).await;
    ingress.shutdown();
}
