//! Cycle timer: per-stage wall-clock decomposition of one loop iteration
//!
//! The iteration total is the sum of its stages, never an independently
//! measured wall time, so `t_total` and `fps` always agree with the parts.

use std::time::{Duration, Instant};

/// Named sub-stage of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Frame acquisition
    Capture,
    /// Face detection
    Detect,
    /// Drawing boxes onto the frame
    Annotate,
    /// Presenting the frame
    Display,
}

impl Stage {
    /// All stages in loop order.
    pub const ALL: [Self; 4] = [Self::Capture, Self::Detect, Self::Annotate, Self::Display];

    /// Metric name under which the stage duration is recorded.
    #[must_use]
    pub const fn metric_name(self) -> &'static str {
        match self {
            Self::Capture => "t_capture",
            Self::Detect => "t_detect",
            Self::Annotate => "t_annotate",
            Self::Display => "t_display",
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Capture => 0,
            Self::Detect => 1,
            Self::Annotate => 2,
            Self::Display => 3,
        }
    }
}

/// Stage durations of a single iteration.
///
/// ```rust
/// use std::time::Duration;
/// use facewatch::timing::{CycleTimings, Stage};
///
/// let mut timings = CycleTimings::default();
/// timings.record(Stage::Capture, Duration::from_millis(10));
/// timings.record(Stage::Detect, Duration::from_millis(30));
/// assert_eq!(timings.total(), Duration::from_millis(40));
/// assert!((timings.fps().unwrap() - 25.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleTimings {
    stages: [Duration; 4],
}

impl CycleTimings {
    /// Run `work` and charge its elapsed time to `stage`.
    ///
    /// Repeated measurements of the same stage accumulate.
    pub fn measure<T>(&mut self, stage: Stage, work: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = work();
        self.record(stage, start.elapsed());
        out
    }

    /// Charge an externally measured duration to `stage`.
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.stages[stage.slot()] += elapsed;
    }

    /// Duration charged to `stage`.
    #[must_use]
    pub const fn stage(&self, stage: Stage) -> Duration {
        self.stages[stage.slot()]
    }

    /// Sum of all stage durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().sum()
    }

    /// Frames per second implied by [`total`](Self::total).
    ///
    /// `None` when the total is exactly zero; the rate is undefined there.
    #[must_use]
    pub fn fps(&self) -> Option<f64> {
        let total = self.total();
        if total.is_zero() {
            None
        } else {
            Some(1.0 / total.as_secs_f64())
        }
    }

    /// Stage durations in seconds, keyed by metric name, followed by `t_total`.
    #[must_use]
    pub fn as_metrics(&self) -> [(&'static str, f64); 5] {
        let secs = |s: Stage| self.stage(s).as_secs_f64();
        [
            (Stage::Capture.metric_name(), secs(Stage::Capture)),
            (Stage::Detect.metric_name(), secs(Stage::Detect)),
            (Stage::Annotate.metric_name(), secs(Stage::Annotate)),
            (Stage::Display.metric_name(), secs(Stage::Display)),
            ("t_total", self.total().as_secs_f64()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_is_sum_of_stages() {
        let mut t = CycleTimings::default();
        t.record(Stage::Capture, Duration::from_micros(1_500));
        t.record(Stage::Detect, Duration::from_micros(20_250));
        t.record(Stage::Annotate, Duration::from_micros(300));
        t.record(Stage::Display, Duration::from_micros(4_000));

        let sum: Duration = Stage::ALL.iter().map(|&s| t.stage(s)).sum();
        assert_eq!(t.total(), sum);
        assert_eq!(t.total(), Duration::from_micros(26_050));
    }

    #[test]
    fn test_fps_undefined_for_zero_total() {
        let t = CycleTimings::default();
        assert_eq!(t.fps(), None);
    }

    #[test]
    fn test_fps_is_reciprocal_of_total() {
        let mut t = CycleTimings::default();
        t.record(Stage::Detect, Duration::from_millis(50));
        let fps = t.fps().unwrap();
        assert!((fps - 20.0).abs() < 1e-9);
        assert!(fps.is_finite());
    }

    #[test]
    fn test_measure_returns_value_and_charges_stage() {
        let mut t = CycleTimings::default();
        let value = t.measure(Stage::Annotate, || {
            std::thread::sleep(Duration::from_millis(2));
            7
        });
        assert_eq!(value, 7);
        assert!(t.stage(Stage::Annotate) >= Duration::from_millis(2));
        assert_eq!(t.stage(Stage::Capture), Duration::ZERO);
    }

    #[test]
    fn test_as_metrics_total_matches_parts() {
        let mut t = CycleTimings::default();
        t.record(Stage::Capture, Duration::from_millis(10));
        t.record(Stage::Detect, Duration::from_millis(30));
        let metrics = t.as_metrics();
        let parts: f64 = metrics[..4].iter().map(|(_, v)| v).sum();
        assert_eq!(metrics[4].0, "t_total");
        assert!((metrics[4].1 - parts).abs() < 1e-12);
    }
}
