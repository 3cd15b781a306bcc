//! Photo preparation pipeline: validate, crop, replace background, tag DPI.
//!
//! Everything operates on in-memory [`image`] buffers; each call owns its
//! buffers for the duration of the call and shares no state with other
//! invocations. The face detector and background segmenter come in as
//! capability traits ([`crate::vision`]) so tests drive the pipeline with
//! deterministic fakes.

use crate::geometry::{self, CropRect};
use crate::standards::PassportStandard;
use crate::vision::{self, BackgroundSegmenter, FaceDetector, SegmentError};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(
        "input image is {width}x{height} px but the {code} standard needs at least \
         {min_width}x{min_height} px. Use a higher-resolution photo."
    )]
    InputTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
        code: &'static str,
    },
    #[error(
        "selected crop is {width}x{height} px, below the {min_width}x{min_height} px \
         target. Enlarge the crop to avoid upscaling."
    )]
    CropTooSmall {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    #[error(transparent)]
    Segmentation(#[from] SegmentError),
}

/// A finished photo with the print resolution it should be encoded at.
#[derive(Debug, Clone)]
pub struct ProcessedPhoto {
    pub image: RgbImage,
    pub dpi: u32,
}

/// Reject inputs smaller than the standard's pixel target in either
/// dimension. Runs before any cropping so undersized uploads fail fast.
pub fn validate_image_size(
    image: &DynamicImage,
    standard: &PassportStandard,
) -> Result<(), PipelineError> {
    let (width, height) = (image.width(), image.height());
    if width < standard.width_px || height < standard.height_px {
        return Err(PipelineError::InputTooSmall {
            width,
            height,
            min_width: standard.width_px,
            min_height: standard.height_px,
            code: standard.code,
        });
    }
    Ok(())
}

/// Scale-to-cover then center-crop to exactly the standard's size.
///
/// Never stretches non-uniformly. An already-exact input passes through
/// untouched so repeated application is pixel-identical.
pub fn aspect_fit(image: &DynamicImage, standard: &PassportStandard) -> RgbImage {
    if (image.width(), image.height()) == standard.size() {
        return image.to_rgb8();
    }
    image
        .resize_to_fill(standard.width_px, standard.height_px, FilterType::Lanczos3)
        .to_rgb8()
}

/// Crop to `rect`, then fit to exactly the standard's size.
///
/// The rectangle is intersected with the image bounds before the minimum
/// size check, so a suggestion that degenerated near a small image's edges
/// fails with `CropTooSmall` instead of upscaling silently.
pub fn crop_image(
    image: &DynamicImage,
    rect: CropRect,
    standard: &PassportStandard,
) -> Result<RgbImage, PipelineError> {
    let cropped = image.crop_imm(rect.left, rect.top, rect.width(), rect.height());

    let (width, height) = (cropped.width(), cropped.height());
    if width < standard.width_px || height < standard.height_px {
        return Err(PipelineError::CropTooSmall {
            width,
            height,
            min_width: standard.width_px,
            min_height: standard.height_px,
        });
    }

    Ok(aspect_fit(&cropped, standard))
}

/// Replace the background with solid white.
///
/// The segmenter's foreground mask is softened with a 1px gaussian blur to
/// tame edge aliasing, then the photo is alpha-blended over an opaque white
/// canvas of the same size.
pub fn remove_background(
    image: &RgbImage,
    segmenter: &impl BackgroundSegmenter,
) -> Result<RgbImage, PipelineError> {
    let mask = segmenter.segment(image)?;
    vision::check_mask_size(&mask, image)?;

    let smooth = image::imageops::blur(&mask, 1.0);

    let (width, height) = image.dimensions();
    let composited = RgbImage::from_fn(width, height, |x, y| {
        let alpha = smooth.get_pixel(x, y).0[0] as u16;
        let fg = image.get_pixel(x, y);
        let mut out = [0u8; 3];
        for c in 0..3 {
            // fg * a + white * (1 - a), in u16 to avoid overflow.
            out[c] = ((fg.0[c] as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
        Rgb(out)
    });

    Ok(composited)
}

/// Produce a standard-compliant passport photo from a decoded image.
///
/// Crop resolution, in priority order:
/// 1. an explicit `crop_box` from the caller,
/// 2. with `auto_crop`, a face-centered suggestion from the detector
///    (detector errors and no-face results degrade to the next option),
/// 3. a plain center aspect-fit of the whole image.
///
/// The cropped photo then gets its background replaced with white and is
/// tagged with the standard's DPI. Size errors from validation and cropping
/// propagate unchanged.
pub fn prepare_passport_photo(
    image: &DynamicImage,
    crop_box: Option<CropRect>,
    auto_crop: bool,
    standard: &PassportStandard,
    detector: &impl FaceDetector,
    segmenter: &impl BackgroundSegmenter,
) -> Result<ProcessedPhoto, PipelineError> {
    validate_image_size(image, standard)?;

    let cropped = if let Some(rect) = crop_box {
        crop_image(image, rect, standard)?
    } else if auto_crop {
        match suggest_face_crop(image, standard, detector) {
            Some(rect) => crop_image(image, rect, standard)?,
            None => aspect_fit(image, standard),
        }
    } else {
        aspect_fit(image, standard)
    };

    let image = remove_background(&cropped, segmenter)?;

    Ok(ProcessedPhoto {
        image,
        dpi: standard.dpi,
    })
}

/// Run detection and turn the largest face into a crop suggestion.
///
/// Detector failure is treated the same as no face found.
fn suggest_face_crop(
    image: &DynamicImage,
    standard: &PassportStandard,
    detector: &impl FaceDetector,
) -> Option<CropRect> {
    let faces = detector.detect_faces(image).unwrap_or_default();
    let face = geometry::largest_face(&faces)?;
    Some(geometry::suggest_crop(
        face,
        image.width(),
        image.height(),
        standard,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FaceBox;
    use crate::standards::get_standard;
    use crate::vision::tests::{MockDetector, MockSegmenter};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn validate_rejects_undersized_input() {
        let uk = get_standard(Some("uk")).unwrap();
        let err = validate_image_size(&gradient_image(400, 400), uk).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InputTooSmall {
                min_width: 413,
                min_height: 531,
                ..
            }
        ));
    }

    #[test]
    fn validate_accepts_exact_size() {
        let us = get_standard(Some("us")).unwrap();
        assert!(validate_image_size(&gradient_image(600, 600), us).is_ok());
    }

    #[test]
    fn crop_in_bounds_box_yields_exact_standard_size() {
        let us = get_standard(Some("us")).unwrap();
        let img = gradient_image(1200, 1000);
        let rect = CropRect {
            left: 100,
            top: 50,
            right: 800,
            bottom: 750,
        };
        let out = crop_image(&img, rect, us).unwrap();
        assert_eq!(out.dimensions(), (600, 600));
    }

    #[test]
    fn crop_below_target_fails() {
        let us = get_standard(Some("us")).unwrap();
        let img = gradient_image(1200, 1000);
        let rect = CropRect {
            left: 0,
            top: 0,
            right: 500,
            bottom: 500,
        };
        assert!(matches!(
            crop_image(&img, rect, us),
            Err(PipelineError::CropTooSmall {
                width: 500,
                height: 500,
                ..
            })
        ));
    }

    #[test]
    fn crop_of_exact_image_is_identity() {
        let us = get_standard(Some("us")).unwrap();
        let img = gradient_image(600, 600);
        let rect = CropRect {
            left: 0,
            top: 0,
            right: 600,
            bottom: 600,
        };
        let out = crop_image(&img, rect, us).unwrap();
        assert_eq!(out, img.to_rgb8());
    }

    #[test]
    fn aspect_fit_produces_standard_size_for_every_builtin() {
        let img = gradient_image(900, 700);
        for standard in crate::standards::all_standards() {
            let out = aspect_fit(&img, standard);
            assert_eq!(out.dimensions(), standard.size(), "{}", standard.code);
        }
    }

    #[test]
    fn remove_background_whitens_masked_out_pixels() {
        struct HalfMask;
        impl BackgroundSegmenter for HalfMask {
            fn segment(&self, image: &RgbImage) -> Result<image::GrayImage, SegmentError> {
                let (w, h) = image.dimensions();
                // Left half foreground, right half background.
                Ok(image::GrayImage::from_fn(w, h, |x, _| {
                    image::Luma([if x < w / 2 { 255 } else { 0 }])
                }))
            }
        }

        let img = RgbImage::from_pixel(40, 40, Rgb([10, 20, 30]));
        let out = remove_background(&img, &HalfMask).unwrap();
        // Away from the blurred seam: foreground kept, background white.
        assert_eq!(out.get_pixel(2, 20), &Rgb([10, 20, 30]));
        assert_eq!(out.get_pixel(37, 20), &Rgb([255, 255, 255]));
    }

    #[test]
    fn pipeline_uses_explicit_crop_box_without_detection() {
        let us = get_standard(Some("us")).unwrap();
        let detector = MockDetector::with_faces(vec![FaceBox {
            x: 0,
            y: 0,
            width: 300,
            height: 300,
        }]);
        let rect = CropRect {
            left: 0,
            top: 0,
            right: 700,
            bottom: 700,
        };

        let photo = prepare_passport_photo(
            &gradient_image(1000, 1000),
            Some(rect),
            true,
            us,
            &detector,
            &MockSegmenter::default(),
        )
        .unwrap();

        assert_eq!(photo.image.dimensions(), (600, 600));
        assert_eq!(photo.dpi, 300);
        assert_eq!(*detector.calls.lock().unwrap(), 0);
    }

    #[test]
    fn pipeline_auto_crop_uses_largest_face() {
        let us = get_standard(Some("us")).unwrap();
        let detector = MockDetector::with_faces(vec![
            FaceBox {
                x: 0,
                y: 0,
                width: 100,
                height: 100,
            },
            FaceBox {
                x: 300,
                y: 300,
                width: 400,
                height: 400,
            },
        ]);

        let photo = prepare_passport_photo(
            &gradient_image(1400, 1400),
            None,
            true,
            us,
            &detector,
            &MockSegmenter::default(),
        )
        .unwrap();

        assert_eq!(photo.image.dimensions(), (600, 600));
        assert_eq!(*detector.calls.lock().unwrap(), 1);
    }

    #[test]
    fn pipeline_detector_failure_degrades_to_aspect_fit() {
        let us = get_standard(Some("us")).unwrap();
        let photo = prepare_passport_photo(
            &gradient_image(900, 700),
            None,
            true,
            us,
            &MockDetector::failing(),
            &MockSegmenter::default(),
        )
        .unwrap();
        assert_eq!(photo.image.dimensions(), (600, 600));
    }

    #[test]
    fn pipeline_no_face_degrades_to_aspect_fit() {
        let us = get_standard(Some("us")).unwrap();
        let photo = prepare_passport_photo(
            &gradient_image(900, 700),
            None,
            true,
            us,
            &MockDetector::default(),
            &MockSegmenter::default(),
        )
        .unwrap();
        assert_eq!(photo.image.dimensions(), (600, 600));
    }

    #[test]
    fn pipeline_segmenter_failure_is_fatal() {
        let us = get_standard(Some("us")).unwrap();
        let result = prepare_passport_photo(
            &gradient_image(900, 700),
            None,
            false,
            us,
            &MockDetector::default(),
            &MockSegmenter::failing(),
        );
        assert!(matches!(result, Err(PipelineError::Segmentation(_))));
    }

    #[test]
    fn pipeline_propagates_input_too_small() {
        let us = get_standard(Some("us")).unwrap();
        let result = prepare_passport_photo(
            &gradient_image(300, 300),
            None,
            false,
            us,
            &MockDetector::default(),
            &MockSegmenter::default(),
        );
        assert!(matches!(result, Err(PipelineError::InputTooSmall { .. })));
    }
}
