//! Face detection and background segmentation interfaces.
//!
//! Both collaborators are modeled as capability traits so the pipeline never
//! depends on a particular model or library: any detector that can produce
//! face boxes and any segmenter that can produce a foreground mask plugs in.
//!
//! The shipped implementations are deliberately model-free:
//! [`NoopFaceDetector`] reports no faces (the pipeline degrades to a center
//! aspect-fit), and [`FlatBackgroundSegmenter`] builds the mask from color
//! distance to the sampled border — good enough for photos shot against a
//! near-uniform backdrop, and a stable seam for wiring in a real matting
//! model later.

use crate::geometry::FaceBox;
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("face detection failed: {0}")]
    DetectionFailed(String),
}

#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("background segmentation failed: {0}")]
    SegmentationFailed(String),
    #[error("mask size {mask_w}x{mask_h} does not match image {image_w}x{image_h}")]
    MaskSizeMismatch {
        mask_w: u32,
        mask_h: u32,
        image_w: u32,
        image_h: u32,
    },
}

/// Locates faces in a decoded image.
///
/// An empty result means detection was inconclusive. A failure here must not
/// be fatal to photo generation; callers fall back to a different crop
/// strategy.
pub trait FaceDetector: Sync {
    fn detect_faces(&self, image: &DynamicImage) -> Result<Vec<FaceBox>, DetectError>;
}

/// Produces a per-pixel foreground mask (255 = foreground) for an image.
///
/// The mask must match the input dimensions. A failure here is fatal to
/// photo generation: without a mask there is no white-background result.
pub trait BackgroundSegmenter: Sync {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage, SegmentError>;
}

/// Detector stand-in that never finds a face.
///
/// Keeps `--auto-crop` functional end to end (via the aspect-fit fallback)
/// on builds without a face model.
pub struct NoopFaceDetector;

impl FaceDetector for NoopFaceDetector {
    fn detect_faces(&self, _image: &DynamicImage) -> Result<Vec<FaceBox>, DetectError> {
        Ok(Vec::new())
    }
}

/// Heuristic segmenter for photos against a near-uniform backdrop.
///
/// Estimates the background color by averaging the one-pixel border ring,
/// then maps each pixel's euclidean RGB distance from that estimate to an
/// alpha value: pixels within `tolerance` fade from 0 to 255, everything
/// farther is fully opaque foreground.
pub struct FlatBackgroundSegmenter {
    pub tolerance: f32,
}

impl Default for FlatBackgroundSegmenter {
    fn default() -> Self {
        Self { tolerance: 60.0 }
    }
}

impl FlatBackgroundSegmenter {
    fn border_mean(image: &RgbImage) -> [f32; 3] {
        let (w, h) = image.dimensions();
        let mut sum = [0f64; 3];
        let mut count = 0u64;

        let mut add = |px: &image::Rgb<u8>| {
            for c in 0..3 {
                sum[c] += px.0[c] as f64;
            }
            count += 1;
        };

        for x in 0..w {
            add(image.get_pixel(x, 0));
            if h > 1 {
                add(image.get_pixel(x, h - 1));
            }
        }
        for y in 1..h.saturating_sub(1) {
            add(image.get_pixel(0, y));
            if w > 1 {
                add(image.get_pixel(w - 1, y));
            }
        }

        [
            (sum[0] / count as f64) as f32,
            (sum[1] / count as f64) as f32,
            (sum[2] / count as f64) as f32,
        ]
    }
}

impl BackgroundSegmenter for FlatBackgroundSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<GrayImage, SegmentError> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(SegmentError::SegmentationFailed("empty image".to_string()));
        }

        let bg = Self::border_mean(image);
        let mask = GrayImage::from_fn(w, h, |x, y| {
            let px = image.get_pixel(x, y);
            let dist = (0..3)
                .map(|c| (px.0[c] as f32 - bg[c]).powi(2))
                .sum::<f32>()
                .sqrt();
            let alpha = (dist / self.tolerance * 255.0).clamp(0.0, 255.0);
            Luma([alpha as u8])
        });

        Ok(mask)
    }
}

/// Validate that a segmenter's mask matches the image it was computed for.
pub fn check_mask_size(mask: &GrayImage, image: &RgbImage) -> Result<(), SegmentError> {
    if mask.dimensions() != image.dimensions() {
        let (mask_w, mask_h) = mask.dimensions();
        let (image_w, image_h) = image.dimensions();
        return Err(SegmentError::MaskSizeMismatch {
            mask_w,
            mask_h,
            image_w,
            image_h,
        });
    }
    Ok(())
}
