//! Frames, face regions and box annotation

use crate::{Error, Result};

/// Faces whose box covers less than this many pixels are dropped by
/// detection adapters (30 x 30).
pub const MIN_FACE_AREA: i64 = 30 * 30;

/// Outline colour for annotated face boxes (B, G, R).
pub const BOX_COLOR: [u8; 3] = [244, 134, 66];

const CHANNELS: usize = 3;

/// A packed 8-bit BGR image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Create a black frame.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Wrap raw BGR bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `data` is not `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "frame {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw BGR bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        usize::try_from(y * i64::from(self.width) + x)
            .ok()
            .map(|p| p * CHANNELS)
    }

    /// Pixel at `(x, y)`, `None` outside the frame.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        let at = self.offset(x, y)?;
        Some([self.data[at], self.data[at + 1], self.data[at + 2]])
    }

    /// Set a pixel; writes outside the frame are ignored.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if let Some(at) = self.offset(x, y) {
            self.data[at..at + CHANNELS].copy_from_slice(&color);
        }
    }

    /// Copy out the part of `bbox` that lies inside the frame.
    #[must_use]
    pub fn crop(&self, bbox: &BoundingBox) -> Self {
        let Some((x0, y0, x1, y1)) = bbox.clamp_to(self.width, self.height) else {
            return Self::new(0, 0);
        };
        let mut out = Vec::with_capacity((x1 - x0) as usize * (y1 - y0) as usize * CHANNELS);
        for y in y0..y1 {
            let row = (y as usize * self.width as usize + x0 as usize) * CHANNELS;
            let len = (x1 - x0) as usize * CHANNELS;
            out.extend_from_slice(&self.data[row..row + len]);
        }
        Self {
            width: x1 - x0,
            height: y1 - y0,
            data: out,
        }
    }
}

/// Face bounding box `(x, y, w, h)` in frame pixels; may extend past the
/// frame edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl BoundingBox {
    /// Create a box.
    #[must_use]
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// `w * h`, zero for degenerate boxes.
    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.w.max(0)) * i64::from(self.h.max(0))
    }

    /// Intersection with a `width x height` frame as `(x0, y0, x1, y1)`,
    /// `None` when empty.
    #[allow(clippy::cast_sign_loss)]
    fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let clamp = |v: i64, hi: u32| v.clamp(0, i64::from(hi)) as u32;
        let x0 = clamp(i64::from(self.x), width);
        let y0 = clamp(i64::from(self.y), height);
        let x1 = clamp(i64::from(self.x) + i64::from(self.w), width);
        let y1 = clamp(i64::from(self.y) + i64::from(self.h), height);
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }
}

/// One detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// Region in the source frame
    pub bbox: BoundingBox,
    /// Five landmarks: eyes, nose tip, mouth corners
    pub landmarks: [(f32, f32); 5],
    /// Detector score in `[0, 1]`
    pub confidence: f32,
    /// Face pixels cut out of the source frame
    pub crop: Frame,
}

/// Drop faces smaller than [`MIN_FACE_AREA`].
pub fn retain_min_area(faces: &mut Vec<Face>) {
    faces.retain(|f| f.bbox.area() >= MIN_FACE_AREA);
}

/// Draws face boxes onto frames.
pub trait Annotator {
    /// Draw `boxes` onto `frame` in place.
    fn annotate(&mut self, frame: &mut Frame, boxes: &[BoundingBox]);
}

/// One-pixel rectangle outlines in [`BOX_COLOR`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BoxAnnotator;

impl Annotator for BoxAnnotator {
    fn annotate(&mut self, frame: &mut Frame, boxes: &[BoundingBox]) {
        for b in boxes {
            if b.w <= 0 || b.h <= 0 {
                continue;
            }
            let (x0, y0) = (i64::from(b.x), i64::from(b.y));
            let (x1, y1) = (x0 + i64::from(b.w) - 1, y0 + i64::from(b.h) - 1);
            for x in x0..=x1 {
                frame.set_pixel(x, y0, BOX_COLOR);
                frame.set_pixel(x, y1, BOX_COLOR);
            }
            for y in y0..=y1 {
                frame.set_pixel(x0, y, BOX_COLOR);
                frame.set_pixel(x1, y, BOX_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(w: i32, h: i32) -> Face {
        Face {
            bbox: BoundingBox::new(0, 0, w, h),
            landmarks: [(0.0, 0.0); 5],
            confidence: 0.9,
            crop: Frame::new(0, 0),
        }
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(Frame::from_raw(2, 2, vec![0; 12]).is_ok());
        assert!(matches!(
            Frame::from_raw(2, 2, vec![0; 11]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_min_area_filter() {
        let mut faces = vec![face(30, 30), face(29, 30), face(100, 40), face(-5, 50)];
        retain_min_area(&mut faces);
        let kept: Vec<_> = faces.iter().map(|f| (f.bbox.w, f.bbox.h)).collect();
        assert_eq!(kept, vec![(30, 30), (100, 40)]);
    }

    #[test]
    fn test_crop_clamped_to_frame() {
        let mut frame = Frame::new(10, 10);
        frame.set_pixel(9, 9, [1, 2, 3]);
        let crop = frame.crop(&BoundingBox::new(7, 7, 10, 10));
        assert_eq!((crop.width(), crop.height()), (3, 3));
        assert_eq!(crop.pixel(2, 2), Some([1, 2, 3]));
        assert_eq!(crop.data().len(), 27);

        let outside = frame.crop(&BoundingBox::new(20, 20, 5, 5));
        assert_eq!((outside.width(), outside.height()), (0, 0));
    }

    #[test]
    fn test_box_annotator_draws_outline() {
        let mut frame = Frame::new(20, 20);
        BoxAnnotator.annotate(&mut frame, &[BoundingBox::new(2, 3, 5, 4)]);
        assert_eq!(frame.pixel(2, 3), Some(BOX_COLOR));
        assert_eq!(frame.pixel(6, 6), Some(BOX_COLOR));
        assert_eq!(frame.pixel(4, 4), Some([0, 0, 0]));
        assert_eq!(frame.pixel(7, 3), Some([0, 0, 0]));
    }

    #[test]
    fn test_box_annotator_ignores_offscreen_parts() {
        let mut frame = Frame::new(4, 4);
        BoxAnnotator.annotate(&mut frame, &[BoundingBox::new(-2, -2, 10, 10)]);
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 0]));
    }
}
