//! Real-time capture/detect/display loop and its collaborator contracts
//!
//! ## Iteration
//!
//! ```text
//! AcquireFrame ─fail─────────────────────────────────────────┐
//!      │ ok                                                  │
//!      ▼                                                     ▼
//!   Detect → Annotate → Display → RecordMetrics → PollScheduler → (cancelled?) → AcquireFrame | Terminate
//! ```
//!
//! Capture, detection, annotation and display are external services reached
//! through the traits below. The loop owns the [`Telemetry`] context and
//! lends it to scheduled jobs between iterations.

mod frame;
mod probe;
mod runner;
pub mod synthetic;
mod telemetry;

pub use frame::{
    retain_min_area, Annotator, BoundingBox, BoxAnnotator, Face, Frame, BOX_COLOR, MIN_FACE_AREA,
};
pub use probe::{FixedProbe, ResourceProbe, ResourceSample, SysinfoProbe};
pub use runner::{Collaborators, FrameStats, IterationOutcome, LoopSummary, MainLoop};
pub use telemetry::{Telemetry, STANDARD_METRICS};

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Frame acquisition contract.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// # Errors
    ///
    /// Returns `CaptureFailure` for a transient failure; the loop skips the
    /// iteration and keeps going.
    fn read(&mut self) -> Result<Frame>;

    /// Frame size `(width, height)`.
    fn resolution(&self) -> (u32, u32);
}

/// Face detection adapter contract.
///
/// Implementations return only faces scoring at least `min_confidence` and
/// covering at least [`MIN_FACE_AREA`] pixels (see [`retain_min_area`]); an
/// empty vector means nothing was detected.
pub trait FaceDetector {
    /// Detect faces in `frame`.
    fn detect(&mut self, frame: &Frame, min_confidence: f32) -> Vec<Face>;

    /// Detector name (for logging).
    fn name(&self) -> &str;
}

/// Frame presentation contract.
pub trait FrameDisplay {
    /// Show an annotated frame.
    ///
    /// # Errors
    ///
    /// Display errors are logged by the loop and do not stop it.
    fn present(&mut self, frame: &Frame) -> Result<()>;

    /// Show the stats of the iteration that just completed.
    fn report(&mut self, _stats: &FrameStats) {}
}

/// Operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Live detection with telemetry
    #[default]
    Checkin,
    /// Enrolment; no capture pipeline
    Registration,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "checkin" => Ok(Self::Checkin),
            "registration" => Ok(Self::Registration),
            other => Err(Error::InvalidInput(format!(
                "unknown mode '{other}', expected 'checkin' or 'registration'"
            ))),
        }
    }
}

/// Exit signal polled once per iteration boundary.
///
/// Clones share the flag, so another thread (or a UI callback) can stop the
/// loop; work already in progress finishes its iteration first.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request exit.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether exit was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Settings the loop is constructed with.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Operating mode
    pub mode: Mode,
    /// Minimum detector score in `[0, 1]`
    pub detection_threshold: f32,
    /// Stop after this many iterations
    pub max_iterations: Option<u64>,
    /// Exit signal
    pub cancel: CancelToken,
}

impl LoopConfig {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the threshold is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(Error::InvalidInput(format!(
                "detection threshold must be within [0, 1], got {}",
                self.detection_threshold
            )));
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Checkin,
            detection_threshold: 0.5,
            max_iterations: None,
            cancel: CancelToken::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let remote = token.clone();
        assert!(!token.is_cancelled());
        remote.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("checkin".parse::<Mode>().unwrap(), Mode::Checkin);
        assert_eq!("registration".parse::<Mode>().unwrap(), Mode::Registration);
        assert!("enrol".parse::<Mode>().is_err());
    }

    #[test]
    fn test_threshold_validation() {
        let mut config = LoopConfig::default();
        assert!(config.validate().is_ok());
        config.detection_threshold = 1.5;
        assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
    }
}
