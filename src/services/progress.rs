use std::sync::atomic::{AtomicU8, Ordering};

/// Caller-supplied progress callback, receives 0..=100
pub type ProgressSink<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Forwards progress to a sink, never reporting a value lower than or equal to
/// one already reported.
pub struct ProgressTracker<'a> {
    sink: &'a ProgressSink<'a>,
    last: AtomicU8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a ProgressSink<'a>) -> Self {
        Self {
            sink,
            last: AtomicU8::new(0),
        }
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            (self.sink)(percent);
        }
    }

    /// Sub-range `[start, end]` of the overall percentage
    pub fn stage(&self, start: u8, end: u8) -> StageProgress<'_> {
        StageProgress {
            tracker: self,
            start,
            end: end.max(start),
        }
    }
}

/// Maps a stage-local fraction onto its slice of the overall percentage
pub struct StageProgress<'t> {
    tracker: &'t ProgressTracker<'t>,
    start: u8,
    end: u8,
}

impl StageProgress<'_> {
    pub fn report_fraction(&self, fraction: f32) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let span = (self.end - self.start) as f32;
        let percent = self.start as f32 + (span * fraction).floor();
        self.tracker.report(percent as u8);
    }
}
