use buswatch_shared::TelemetryRecord;

// ============================================================================
// Update coalescer: a single pending slot plus a render-in-flight guard.
// The async side (arming the actual tokio timer, yielding before the sink
// call) lives in the controller; everything order-sensitive is in here so
// the invariants can be tested without a runtime or a rendering stack.
// ============================================================================

/// Collapses a fast-arriving record stream into at most one render per
/// throttle window, always using the newest record.
#[derive(Default)]
pub struct Coalescer {
    pending: Option<TelemetryRecord>,
    timer_armed: bool,
    render_in_flight: bool,
}

impl Coalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` as the pending update, overwriting any unconsumed
    /// predecessor. Returns true when the caller must arm the throttle
    /// timer: only the first submit of a window arms it, later ones just
    /// replace the value.
    #[must_use]
    pub fn submit(&mut self, record: TelemetryRecord) -> bool {
        self.pending = Some(record);
        if self.timer_armed {
            false
        } else {
            self.timer_armed = true;
            true
        }
    }

    /// Timer expiry. Hands out the pending record (marking a render in
    /// flight) unless one is already in flight — then the firing is
    /// ignored and the value waits for the next submit/arm cycle.
    pub fn fire(&mut self) -> Option<TelemetryRecord> {
        self.timer_armed = false;
        if self.render_in_flight {
            return None;
        }
        let record = self.pending.take()?;
        self.render_in_flight = true;
        Some(record)
    }

    /// Render finished. Must run on every exit path, success or failure;
    /// a stuck in-flight flag would block all future updates.
    pub fn render_done(&mut self) {
        self.render_in_flight = false;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(h: f64) -> TelemetryRecord {
        TelemetryRecord {
            humidity: Some(h),
            ..Default::default()
        }
    }

    #[test]
    fn burst_renders_once_with_the_last_record() {
        let mut c = Coalescer::new();

        // t=0, 10, 50, 90: only the first submit arms the timer.
        assert!(c.submit(rec(1.0)));
        assert!(!c.submit(rec(2.0)));
        assert!(!c.submit(rec(3.0)));
        assert!(!c.submit(rec(4.0)));

        let fired = c.fire().expect("one render");
        assert_eq!(fired.humidity, Some(4.0));
        c.render_done();

        // Nothing left over from the burst.
        assert!(!c.has_pending());
        assert!(c.fire().is_none());
    }

    #[test]
    fn submit_after_fire_arms_a_fresh_timer() {
        let mut c = Coalescer::new();
        assert!(c.submit(rec(1.0)));
        assert!(c.fire().is_some());
        c.render_done();

        assert!(c.submit(rec(2.0)));
        assert_eq!(c.fire().unwrap().humidity, Some(2.0));
        c.render_done();
    }

    #[test]
    fn fire_during_render_is_ignored() {
        let mut c = Coalescer::new();
        assert!(c.submit(rec(1.0)));
        let first = c.fire().expect("render starts");
        assert_eq!(first.humidity, Some(1.0));

        // New record lands while the render is still in flight; its timer
        // fires before the render completes.
        assert!(c.submit(rec(2.0)));
        assert!(c.fire().is_none(), "single-flight guard");

        // Completion must not retroactively flush the pending value.
        c.render_done();
        assert!(c.has_pending());

        // The value goes out on the next submit/arm cycle.
        assert!(c.submit(rec(3.0)));
        assert_eq!(c.fire().unwrap().humidity, Some(3.0));
        c.render_done();
    }

    #[test]
    fn render_done_clears_the_guard_after_a_failed_render() {
        let mut c = Coalescer::new();
        assert!(c.submit(rec(1.0)));
        assert!(c.fire().is_some());
        // Sink failed; the driver still calls render_done on the error path.
        c.render_done();

        assert!(c.submit(rec(2.0)));
        assert!(c.fire().is_some(), "a failed render must not wedge the pipeline");
    }

    #[test]
    fn fire_with_nothing_pending_is_a_no_op() {
        let mut c = Coalescer::new();
        assert!(c.fire().is_none());
        c.render_done();
        assert!(c.fire().is_none());
    }
}
