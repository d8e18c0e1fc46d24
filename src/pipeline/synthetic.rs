//! Camera-free collaborators: generated frames, a scripted detector and a
//! log-only display. Used by the `facewatch` binary when no device is
//! attached, and by tests.

use tracing::debug;

use super::{
    retain_min_area, BoundingBox, Face, FaceDetector, Frame, FrameDisplay, FrameSource, FrameStats,
};
use crate::{Error, Result};

/// Generates moving gradient frames, optionally failing every `n`th read.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    width: u32,
    height: u32,
    reads: u64,
    fail_every: Option<u64>,
}

impl SyntheticSource {
    /// Create a source producing `width x height` frames.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            reads: 0,
            fail_every: None,
        }
    }

    /// Make every `n`th read a capture failure (`0` disables).
    #[must_use]
    pub const fn fail_every(mut self, n: u64) -> Self {
        self.fail_every = if n == 0 { None } else { Some(n) };
        self
    }

    /// Reads attempted so far.
    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.reads
    }
}

impl FrameSource for SyntheticSource {
    #[allow(clippy::cast_possible_truncation)]
    fn read(&mut self) -> Result<Frame> {
        self.reads += 1;
        if self.fail_every.is_some_and(|n| self.reads % n == 0) {
            return Err(Error::CaptureFailure(format!(
                "synthetic dropout at read {}",
                self.reads
            )));
        }

        let shift = self.reads as u32;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = (x.wrapping_add(y).wrapping_add(shift) & 0xff) as u8;
                data.extend_from_slice(&[v, v / 2, 255 - v]);
            }
        }
        Frame::from_raw(self.width, self.height, data)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Detector that "finds" one face sweeping across the frame.
///
/// Each call also produces a tiny face (below [`MIN_FACE_AREA`]) and a
/// low-scoring face, which the adapter filters out the way a real one would.
///
/// [`MIN_FACE_AREA`]: super::MIN_FACE_AREA
#[derive(Debug, Default, Clone)]
pub struct SyntheticDetector {
    calls: u32,
}

impl SyntheticDetector {
    const FACE_SIZE: i32 = 120;

    fn candidate(frame: &Frame, bbox: BoundingBox, confidence: f32) -> Face {
        #[allow(clippy::cast_precision_loss)]
        let (x, y, w, h) = (bbox.x as f32, bbox.y as f32, bbox.w as f32, bbox.h as f32);
        Face {
            bbox,
            landmarks: [
                (x + 0.3 * w, y + 0.4 * h),
                (x + 0.7 * w, y + 0.4 * h),
                (x + 0.5 * w, y + 0.6 * h),
                (x + 0.35 * w, y + 0.8 * h),
                (x + 0.65 * w, y + 0.8 * h),
            ],
            confidence,
            crop: frame.crop(&bbox),
        }
    }
}

impl FaceDetector for SyntheticDetector {
    fn detect(&mut self, frame: &Frame, min_confidence: f32) -> Vec<Face> {
        self.calls = self.calls.wrapping_add(1);
        let width = i32::try_from(frame.width()).unwrap_or(i32::MAX);
        let span = (width - Self::FACE_SIZE).max(1);
        let x = i32::try_from(self.calls.wrapping_mul(8)).unwrap_or(0) % span;

        let mut faces = vec![
            Self::candidate(frame, BoundingBox::new(x, 40, Self::FACE_SIZE, Self::FACE_SIZE), 0.92),
            Self::candidate(frame, BoundingBox::new(10, 10, 20, 20), 0.95),
            Self::candidate(frame, BoundingBox::new(200, 200, 80, 80), 0.30),
        ];
        faces.retain(|f| f.confidence >= min_confidence);
        retain_min_area(&mut faces);
        faces
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Display that drops frames and logs per-frame stats at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDisplay {
    presented: u64,
}

impl LogDisplay {
    /// Frames presented so far.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl FrameDisplay for LogDisplay {
    fn present(&mut self, _frame: &Frame) -> Result<()> {
        self.presented += 1;
        Ok(())
    }

    fn report(&mut self, stats: &FrameStats) {
        debug!(
            fps = stats.fps,
            time_s = stats.total.as_secs_f64(),
            faces = stats.faces,
            "Frame stats"
        );
    }
}
