// Terminal presentation for the pipeline: a full-screen text frame per
// render pass. This is deliberately the dumbest possible sink — all the
// interesting guarantees live upstream of the RenderSink boundary.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use buswatch_shared::TelemetryRecord;

use crate::ingress::ConnectionState;
use crate::series::{ChartMetric, RingBuffer, SeriesWindow};
use crate::sink::{RenderSink, StatusSink};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const PLACEHOLDER: &str = "-";

/// Build the two sinks for a terminal dashboard. They share the
/// connection state so the frame header can show connectivity.
pub fn term_sinks(history_rows: usize) -> (TermSink, TermStatus) {
    let status = Arc::new(Mutex::new(ConnectionState::Connecting));
    (
        TermSink {
            status: status.clone(),
            history: RingBuffer::new(history_rows),
        },
        TermStatus { status },
    )
}

pub struct TermSink {
    status: Arc<Mutex<ConnectionState>>,
    history: RingBuffer<String>,
}

pub struct TermStatus {
    status: Arc<Mutex<ConnectionState>>,
}

impl StatusSink for TermStatus {
    fn connection_state_changed(&mut self, state: ConnectionState) {
        tracing::info!(%state, "connection state");
        if let Ok(mut s) = self.status.lock() {
            *s = state;
        }
    }
}

impl RenderSink for TermSink {
    fn render_live_values(&mut self, record: &TelemetryRecord) -> anyhow::Result<()> {
        let state = self
            .status
            .lock()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Disconnected);

        let mut out = io::stdout().lock();
        // Home + clear: redraw the whole frame in place.
        write!(out, "\x1b[H\x1b[2J")?;
        writeln!(out, "BUS TELEMETRY                         [{state}]")?;
        writeln!(
            out,
            "humidity {:>6}   temp {:>6} / {:>6}   passengers {:>4}",
            fmt_f(record.humidity, "%"),
            fmt_f(record.temp_c, "°C"),
            fmt_f(record.temp_f, "°F"),
            fmt_u(record.passengers),
        )?;
        writeln!(
            out,
            "distance {:>6}   buzzer {:>4}   gps {}",
            fmt_f(record.distance, "cm"),
            record.buzzer.map(|b| b.as_str()).unwrap_or(PLACEHOLDER),
            fmt_gps(record),
        )?;
        writeln!(out)?;
        Ok(())
    }

    fn render_series(&mut self, metric: ChartMetric, window: &SeriesWindow) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "{:<14} {:<width$} {}",
            metric.label(),
            sparkline(window),
            window
                .latest()
                .and_then(|s| s.value)
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            width = window.capacity(),
        )?;
        Ok(())
    }

    fn render_history_row(&mut self, record: &TelemetryRecord, seq: u64) -> anyhow::Result<()> {
        self.history.push(format!(
            "{seq:>6}  {:>7}  {:>7}  {:>7}  {:>5}  {:>8}  {:>4}  {:>10}  {:>10}",
            fmt_f(record.humidity, ""),
            fmt_f(record.temp_c, ""),
            fmt_f(record.temp_f, ""),
            fmt_u(record.passengers),
            fmt_f(record.distance, ""),
            record.buzzer.map(|b| b.as_str()).unwrap_or(PLACEHOLDER),
            fmt_coord(record.latitude),
            fmt_coord(record.longitude),
        ));

        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(
            out,
            "{:>6}  {:>7}  {:>7}  {:>7}  {:>5}  {:>8}  {:>4}  {:>10}  {:>10}",
            "#", "hum", "°C", "°F", "pax", "dist", "buz", "lat", "lon",
        )?;
        // Newest last, like the incoming stream.
        for row in self.history.iter() {
            writeln!(out, "{row}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Map a window onto one block character per sample; gap samples render
/// as blanks so a dropout is visible instead of interpolated away.
pub fn sparkline(window: &SeriesWindow) -> String {
    let values: Vec<Option<f64>> = window.samples().map(|s| s.value).collect();

    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.iter().flatten() {
        lo = lo.min(*v);
        hi = hi.max(*v);
    }

    let mut out = String::with_capacity(values.len() * 3);
    for v in &values {
        match v {
            None => out.push(' '),
            Some(x) => {
                let level = if hi > lo {
                    (((x - lo) / (hi - lo)) * (SPARK_LEVELS.len() - 1) as f64).round() as usize
                } else {
                    0
                };
                out.push(SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]);
            }
        }
    }
    out
}

fn fmt_f(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(x) => {
            let mut s = format!("{x:.1}");
            let _ = write!(s, "{unit}");
            s
        }
        None => PLACEHOLDER.to_string(),
    }
}

fn fmt_u(v: Option<u32>) -> String {
    v.map(|x| x.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn fmt_coord(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn fmt_gps(record: &TelemetryRecord) -> String {
    match record.gps() {
        Some((lat, lon)) => format!("{lat:.6}, {lon:.6}"),
        None => "no signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_scales_between_window_extremes() {
        let mut w = SeriesWindow::new(4);
        w.push(1, Some(0.0));
        w.push(2, Some(5.0));
        w.push(3, Some(10.0));
        let s: Vec<char> = sparkline(&w).chars().collect();
        assert_eq!(s.len(), 3);
        assert_eq!(s[0], SPARK_LEVELS[0]);
        assert_eq!(s[2], SPARK_LEVELS[7]);
    }

    #[test]
    fn sparkline_renders_gaps_as_blanks() {
        let mut w = SeriesWindow::new(4);
        w.push(1, Some(1.0));
        w.push(2, None);
        w.push(3, Some(2.0));
        assert_eq!(sparkline(&w), format!("{} {}", SPARK_LEVELS[0], SPARK_LEVELS[7]));
    }

    #[test]
    fn sparkline_handles_flat_and_empty_windows() {
        let mut w = SeriesWindow::new(4);
        assert_eq!(sparkline(&w), "");
        w.push(1, Some(3.0));
        w.push(2, Some(3.0));
        assert_eq!(sparkline(&w), format!("{}{}", SPARK_LEVELS[0], SPARK_LEVELS[0]));
    }

    #[test]
    fn absent_values_format_as_placeholder_not_zero() {
        assert_eq!(fmt_f(None, "%"), "-");
        assert_eq!(fmt_f(Some(55.0), "%"), "55.0%");
        assert_eq!(fmt_u(None), "-");
        assert_eq!(fmt_coord(None), "-");

        let rec = TelemetryRecord {
            latitude: Some(7.2597),
            ..Default::default()
        };
        assert_eq!(fmt_gps(&rec), "no signal");
    }
}
