use std::collections::VecDeque;

use buswatch_shared::TelemetryRecord;

/// Fixed-capacity FIFO: once full, the oldest entry is evicted before the
/// new one is appended.
pub struct RingBuffer<T> {
    max: usize,
    buf: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    pub fn new(max: usize) -> Self {
        assert!(max > 0, "ring buffer capacity must be nonzero");
        Self {
            max,
            buf: VecDeque::with_capacity(max),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.buf.len() == self.max {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    pub fn back(&self) -> Option<&T> {
        self.buf.back()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max
    }
}

/// One chart point. `value: None` is a gap: the record that produced this
/// tick carried no reading for the metric. Gaps keep index-aligned series
/// (°C/°F on one x-axis) the same length instead of silently drifting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub seq: u64,
    pub value: Option<f64>,
}

/// The metrics that get a rolling chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartMetric {
    Humidity,
    TempC,
    TempF,
    Passengers,
    Distance,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 5] = [
        ChartMetric::Humidity,
        ChartMetric::TempC,
        ChartMetric::TempF,
        ChartMetric::Passengers,
        ChartMetric::Distance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartMetric::Humidity => "Humidity (%)",
            ChartMetric::TempC => "Temp (°C)",
            ChartMetric::TempF => "Temp (°F)",
            ChartMetric::Passengers => "Passengers",
            ChartMetric::Distance => "Distance (cm)",
        }
    }

    fn value_of(&self, rec: &TelemetryRecord) -> Option<f64> {
        match self {
            ChartMetric::Humidity => rec.humidity,
            ChartMetric::TempC => rec.temp_c,
            ChartMetric::TempF => rec.temp_f,
            ChartMetric::Passengers => rec.passengers.map(f64::from),
            ChartMetric::Distance => rec.distance,
        }
    }
}

/// Rolling window of the most recent samples for one metric.
///
/// Sequence indices are strictly increasing; a sample whose `seq` does not
/// advance past the newest retained one is dropped rather than reordering
/// the window.
pub struct SeriesWindow {
    ring: RingBuffer<Sample>,
}

impl SeriesWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
        }
    }

    pub fn push(&mut self, seq: u64, value: Option<f64>) {
        if let Some(last) = self.ring.back()
            && seq <= last.seq
        {
            return;
        }
        self.ring.push(Sample { seq, value });
    }

    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.ring.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.ring.back()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

/// One window per chart metric, all fed from the same record under one
/// `&mut` call so aligned groups can never drift apart.
pub struct SeriesBank {
    windows: [SeriesWindow; ChartMetric::ALL.len()],
}

impl SeriesBank {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: std::array::from_fn(|_| SeriesWindow::new(capacity)),
        }
    }

    /// Append every chart metric from `rec` at sequence index `seq`.
    /// A metric the record does not carry gets an explicit gap sample.
    pub fn append_record(&mut self, seq: u64, rec: &TelemetryRecord) {
        for metric in ChartMetric::ALL {
            self.windows[metric as usize].push(seq, metric.value_of(rec));
        }
    }

    /// Read-only view of one metric's window, for rendering.
    pub fn snapshot(&self, metric: ChartMetric) -> &SeriesWindow {
        &self.windows[metric as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(window: &SeriesWindow) -> Vec<Option<f64>> {
        window.samples().map(|s| s.value).collect()
    }

    #[test]
    fn window_keeps_exactly_the_last_capacity_samples() {
        let mut w = SeriesWindow::new(3);
        for (i, v) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            w.push(i as u64 + 1, Some(*v));
        }
        assert_eq!(w.len(), 3);
        assert_eq!(values(&w), vec![Some(3.0), Some(4.0), Some(5.0)]);
    }

    #[test]
    fn window_length_is_min_of_appends_and_capacity() {
        for n in 0..20u64 {
            let mut w = SeriesWindow::new(7);
            for i in 0..n {
                w.push(i + 1, Some(i as f64));
            }
            assert_eq!(w.len(), (n as usize).min(7));

            // Retained values are exactly the last min(n, 7), in order.
            let expect: Vec<Option<f64>> = (n.saturating_sub(7)..n).map(|i| Some(i as f64)).collect();
            assert_eq!(values(&w), expect);
        }
    }

    #[test]
    fn stale_sequence_index_is_dropped() {
        let mut w = SeriesWindow::new(4);
        w.push(5, Some(1.0));
        w.push(5, Some(2.0));
        w.push(3, Some(3.0));
        assert_eq!(w.len(), 1);
        assert_eq!(w.latest().unwrap().value, Some(1.0));
        w.push(6, Some(4.0));
        assert_eq!(w.latest().unwrap().seq, 6);
    }

    #[test]
    fn bank_appends_all_metrics_atomically() {
        let mut bank = SeriesBank::new(10);
        let rec = TelemetryRecord {
            temp_c: Some(29.4),
            // temp_f absent this tick: the °F window must gap, not lag.
            ..Default::default()
        };
        bank.append_record(1, &rec);

        for metric in ChartMetric::ALL {
            assert_eq!(bank.snapshot(metric).len(), 1, "{metric:?} out of step");
        }
        assert_eq!(bank.snapshot(ChartMetric::TempC).latest().unwrap().value, Some(29.4));
        assert_eq!(bank.snapshot(ChartMetric::TempF).latest().unwrap().value, None);
    }

    #[test]
    fn passenger_counts_chart_as_numbers() {
        let mut bank = SeriesBank::new(4);
        let rec = TelemetryRecord {
            passengers: Some(42),
            ..Default::default()
        };
        bank.append_record(1, &rec);
        assert_eq!(
            bank.snapshot(ChartMetric::Passengers).latest().unwrap().value,
            Some(42.0)
        );
    }

    #[test]
    fn ring_buffer_reports_capacity_and_eviction() {
        let mut rb = RingBuffer::new(2);
        assert!(rb.is_empty());
        rb.push("a");
        rb.push("b");
        rb.push("c");
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.capacity(), 2);
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(rb.back(), Some(&"c"));
    }
}
