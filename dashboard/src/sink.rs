use anyhow::Result;
use buswatch_shared::TelemetryRecord;

use crate::ingress::ConnectionState;
use crate::series::{ChartMetric, SeriesWindow};

/// Where coalesced records end up. Implementations own the presentation
/// technology; the controller catches and logs their errors, so a broken
/// sink can never stall the pipeline.
pub trait RenderSink {
    /// Latest numeric readouts. An absent field must render as a
    /// placeholder, never as zero or a stale value.
    fn render_live_values(&mut self, record: &TelemetryRecord) -> Result<()>;

    /// Redraw one metric's rolling window.
    fn render_series(&mut self, metric: ChartMetric, window: &SeriesWindow) -> Result<()>;

    /// Append one row to the bounded history table.
    fn render_history_row(&mut self, record: &TelemetryRecord, seq: u64) -> Result<()>;
}

/// Connectivity indicator, fed from ingress state transitions
/// independently of record delivery.
pub trait StatusSink {
    fn connection_state_changed(&mut self, state: ConnectionState);
}
