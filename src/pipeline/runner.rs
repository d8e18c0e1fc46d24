//! Main loop: acquire → detect → annotate → display → record → poll

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{
    Annotator, BoundingBox, FaceDetector, FrameDisplay, FrameSource, LoopConfig, Mode,
    ResourceProbe, ResourceSample, Telemetry,
};
use crate::schedule::Scheduler;
use crate::timing::{CycleTimings, Stage};
use crate::Result;

/// External collaborators driven by the loop.
pub struct Collaborators {
    /// Camera or video source
    pub source: Box<dyn FrameSource>,
    /// Face detection adapter
    pub detector: Box<dyn FaceDetector>,
    /// Box renderer
    pub annotator: Box<dyn Annotator>,
    /// Frame presenter
    pub display: Box<dyn FrameDisplay>,
    /// CPU / memory sampler
    pub probe: Box<dyn ResourceProbe>,
}

/// Per-frame stats shown next to the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Reciprocal of `total`
    pub fps: f64,
    /// Sum of stage durations
    pub total: Duration,
    /// Faces kept by the detector
    pub faces: usize,
}

/// What happened in one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationOutcome {
    /// Frame processed and one row recorded
    Recorded(FrameStats),
    /// Capture failed; the rest of the iteration was skipped
    CaptureFailed,
    /// Stages summed to zero; fps undefined so no row was recorded
    ZeroDuration,
}

/// Counters over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Iterations started
    pub iterations: u64,
    /// Rows recorded
    pub recorded: u64,
    /// Iterations abandoned on capture failure
    pub capture_failures: u64,
    /// Iterations not recorded because their total time was zero
    pub skipped_zero_duration: u64,
    /// Scheduled job callbacks that failed
    pub job_failures: u64,
}

/// The real-time loop plus its cooperative background jobs.
pub struct MainLoop {
    config: LoopConfig,
    parts: Collaborators,
    telemetry: Telemetry,
    scheduler: Scheduler<Telemetry>,
    summary: LoopSummary,
    last_resources: ResourceSample,
}

impl MainLoop {
    /// Assemble a loop. Jobs must already be registered on `scheduler`.
    #[must_use]
    pub fn new(
        config: LoopConfig,
        parts: Collaborators,
        telemetry: Telemetry,
        scheduler: Scheduler<Telemetry>,
    ) -> Self {
        Self {
            config,
            parts,
            telemetry,
            scheduler,
            summary: LoopSummary::default(),
            last_resources: ResourceSample::default(),
        }
    }

    /// Run until cancelled or `max_iterations` is reached, then flush the
    /// remaining rows into a final segment.
    ///
    /// Buffered rows are also flushed when an iteration fails with a
    /// non-transient error, before that error is returned.
    ///
    /// # Errors
    ///
    /// Returns non-transient errors (schema misuse, a broken source, final
    /// flush failure). Capture failures and job failures are counted, not
    /// returned.
    pub fn run(&mut self) -> Result<LoopSummary> {
        let (width, height) = self.parts.source.resolution();
        info!(
            "Starting at resolution: {width}x{height} (detector: {})",
            self.parts.detector.name()
        );

        if self.config.mode == Mode::Registration {
            info!("Registration mode has no capture pipeline, nothing to run");
            return Ok(self.summary);
        }

        while !self.config.cancel.is_cancelled() {
            if self
                .config
                .max_iterations
                .is_some_and(|max| self.summary.iterations >= max)
            {
                break;
            }
            match self.step() {
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "Iteration failed, continuing");
                }
                Err(e) => {
                    warn!(error = %e, "Loop stopped, flushing buffered rows");
                    if let Err(flush) = self.telemetry.rotate() {
                        warn!(error = %flush, "Final flush failed");
                    }
                    return Err(e);
                }
            }
        }

        self.telemetry.rotate()?;
        info!(summary = ?self.summary, "Loop finished");
        Ok(self.summary)
    }

    /// One iteration: real-time work, then one scheduler poll.
    ///
    /// # Errors
    ///
    /// Returns errors from recording the row and non-transient source
    /// errors; capture failures are reported as
    /// [`IterationOutcome::CaptureFailed`].
    pub fn step(&mut self) -> Result<IterationOutcome> {
        self.summary.iterations += 1;
        let mut timings = CycleTimings::default();

        let parts = &mut self.parts;
        let outcome = match timings.measure(Stage::Capture, || parts.source.read()) {
            Err(e) if e.is_transient() => {
                self.summary.capture_failures += 1;
                warn!(error = %e, "Cant capture image, skipping frame");
                IterationOutcome::CaptureFailed
            }
            Err(e) => return Err(e),
            Ok(mut frame) => {
                let threshold = self.config.detection_threshold;
                let faces = timings.measure(Stage::Detect, || parts.detector.detect(&frame, threshold));
                let boxes: Vec<BoundingBox> = faces.iter().map(|f| f.bbox).collect();
                timings.measure(Stage::Annotate, || parts.annotator.annotate(&mut frame, &boxes));
                let shown = timings.measure(Stage::Display, || parts.display.present(&frame));
                if let Err(e) = shown {
                    warn!(error = %e, "Display failed");
                }
                drop(frame);
                self.record(&timings, faces.len())?
            }
        };

        let report = self.scheduler.run_pending(&mut self.telemetry);
        self.summary.job_failures += report.failures.len() as u64;
        if !report.is_idle() {
            debug!(jobs = ?report.fired, "Ran scheduled jobs");
        }

        Ok(outcome)
    }

    fn record(&mut self, timings: &CycleTimings, faces: usize) -> Result<IterationOutcome> {
        let Some(fps) = timings.fps() else {
            self.summary.skipped_zero_duration += 1;
            debug!("Zero-duration iteration, fps undefined; not recorded");
            return Ok(IterationOutcome::ZeroDuration);
        };

        let resources = self.sample_resources();
        #[allow(clippy::cast_precision_loss)]
        let face_count = faces as f64;

        let mut values: Vec<(&str, f64)> = timings.as_metrics().to_vec();
        values.extend([
            ("fps", fps),
            ("faces", face_count),
            ("cpu_percent", resources.cpu_percent),
            ("mem_percent", resources.mem_percent),
        ]);
        self.telemetry.record(values)?;
        self.summary.recorded += 1;

        let stats = FrameStats {
            fps,
            total: timings.total(),
            faces,
        };
        self.parts.display.report(&stats);
        Ok(IterationOutcome::Recorded(stats))
    }

    /// A finite probe sample; a NaN or infinite reading is replaced by the
    /// last good one so the row stays recordable.
    fn sample_resources(&mut self) -> ResourceSample {
        let sample = self.parts.probe.sample();
        if sample.cpu_percent.is_finite() && sample.mem_percent.is_finite() {
            self.last_resources = sample;
            sample
        } else {
            warn!(?sample, "Non-finite resource sample, reusing the previous one");
            self.last_resources
        }
    }

    /// The telemetry context.
    #[must_use]
    pub const fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Counters so far.
    #[must_use]
    pub const fn summary(&self) -> LoopSummary {
        self.summary
    }
}
