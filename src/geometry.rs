//! Pure crop-geometry functions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are image pixels, origin top-left.

use crate::standards::PassportStandard;

/// Axis-aligned face bounding box as reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A crop rectangle with exclusive right/bottom edges.
///
/// Invariant: `right > left` and `bottom > top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn to_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }
}

/// Pick the detection to crop around when a detector returns several.
///
/// Largest area wins; ties keep the earlier detection.
pub fn largest_face(faces: &[FaceBox]) -> Option<FaceBox> {
    faces.iter().copied().max_by_key(FaceBox::area)
}

/// Suggest a face-centered crop matching the standard's aspect ratio.
///
/// The crop is sized to contain the face box expanded by the standard's
/// face-padding factor in both dimensions: target height is
/// `max(h * padding, w * padding / ratio)` so neither axis ends up tighter
/// than the padded face demands, and width follows from the aspect ratio.
///
/// Out-of-bounds boxes are translated back inside the image rather than
/// resized, so the result keeps the target aspect whenever the image is
/// large enough. The translation happens before the final >= 0 floor; the
/// order matters near corners of small images. When the image is smaller
/// than the padded crop in a dimension, the floor leaves a box narrower
/// than requested rather than re-shrinking both axes. Callers that need an
/// exact-ratio crop catch this downstream via the minimum-size check.
pub fn suggest_crop(
    face: FaceBox,
    image_width: u32,
    image_height: u32,
    standard: &PassportStandard,
) -> CropRect {
    let cx = face.x as f64 + face.width as f64 / 2.0;
    let cy = face.y as f64 + face.height as f64 / 2.0;

    let ratio = standard.aspect_ratio();
    let padding = standard.face_padding;

    let target_h = (face.height as f64 * padding).max(face.width as f64 * padding / ratio);
    let target_w = target_h * ratio;

    let mut left = (cx - target_w / 2.0).round() as i64;
    let mut top = (cy - target_h / 2.0).round() as i64;
    let mut right = left + target_w.round() as i64;
    let mut bottom = top + target_h.round() as i64;

    // Translate (never resize) to stay in bounds.
    if left < 0 {
        right -= left;
        left = 0;
    }
    if top < 0 {
        bottom -= top;
        top = 0;
    }
    if right > image_width as i64 {
        let overflow = right - image_width as i64;
        left -= overflow;
        right -= overflow;
    }
    if bottom > image_height as i64 {
        let overflow = bottom - image_height as i64;
        top -= overflow;
        bottom -= overflow;
    }

    // Final safety floor. Must run after the translations above.
    left = left.max(0);
    top = top.max(0);

    CropRect {
        left: left as u32,
        top: top as u32,
        right: right.max(left + 1) as u32,
        bottom: bottom.max(top + 1) as u32,
    }
}
