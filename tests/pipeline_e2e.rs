//! End-to-end pipeline test: synthetic portrait in, compliant JPEG out.

use idphoto::geometry::FaceBox;
use idphoto::pipeline::prepare_passport_photo;
use idphoto::sheet::create_passport_sheet;
use idphoto::standards::get_standard;
use idphoto::vision::{BackgroundSegmenter, DetectError, FaceDetector, FlatBackgroundSegmenter};
use idphoto::{encode, vision};
use image::{DynamicImage, Rgb, RgbImage};

/// Synthetic portrait: dark oval "head" on a light gray backdrop, with the
/// head centered in the given face box.
fn synthetic_portrait(width: u32, height: u32, face: FaceBox) -> DynamicImage {
    let cx = face.x as f64 + face.width as f64 / 2.0;
    let cy = face.y as f64 + face.height as f64 / 2.0;
    let rx = face.width as f64 / 2.0;
    let ry = face.height as f64 / 2.0;

    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let dx = (x as f64 - cx) / rx;
        let dy = (y as f64 - cy) / ry;
        if dx * dx + dy * dy <= 1.0 {
            Rgb([90, 60, 50])
        } else {
            Rgb([210, 210, 210])
        }
    }))
}

/// Detector scripted with the face that the synthetic portrait contains.
struct ScriptedDetector(FaceBox);

impl FaceDetector for ScriptedDetector {
    fn detect_faces(&self, _image: &DynamicImage) -> Result<Vec<FaceBox>, DetectError> {
        Ok(vec![self.0])
    }
}

#[test]
fn portrait_to_passport_photo_and_sheet() {
    let us = get_standard(Some("us")).unwrap();
    let face = FaceBox {
        x: 500,
        y: 300,
        width: 400,
        height: 400,
    };
    let portrait = synthetic_portrait(1400, 1600, face);

    let photo = prepare_passport_photo(
        &portrait,
        None,
        true,
        us,
        &ScriptedDetector(face),
        &FlatBackgroundSegmenter::default(),
    )
    .unwrap();

    assert_eq!(photo.image.dimensions(), (600, 600));
    assert_eq!(photo.dpi, 300);

    // Backdrop became white; the face stayed dark. The crop is centered on
    // the face, so the photo center is inside the head and the corner is
    // background.
    let center = photo.image.get_pixel(300, 300);
    assert!(center.0[0] < 150, "face pixel unexpectedly light: {center:?}");
    assert_eq!(photo.image.get_pixel(3, 3), &Rgb([255, 255, 255]));

    let sheet = create_passport_sheet(&photo.image, None, us).unwrap();
    assert_eq!(sheet.image.dimensions(), (1200, 1800));

    // Sheet holds the photo verbatim in the four default cells.
    assert_eq!(sheet.image.get_pixel(300, 300), photo.image.get_pixel(300, 300));
    assert_eq!(sheet.image.get_pixel(900, 900), photo.image.get_pixel(300, 300));
}

#[test]
fn encoded_artifacts_carry_standard_dpi() {
    let uk = get_standard(Some("uk")).unwrap();
    let face = FaceBox {
        x: 600,
        y: 400,
        width: 350,
        height: 420,
    };
    let portrait = synthetic_portrait(1600, 2000, face);

    let photo = prepare_passport_photo(
        &portrait,
        None,
        true,
        uk,
        &ScriptedDetector(face),
        &FlatBackgroundSegmenter::default(),
    )
    .unwrap();
    assert_eq!(photo.image.dimensions(), (413, 531));

    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("uk_passport.jpg");
    encode::save_jpeg(&photo, &path).unwrap();

    let reloaded = encode::load_image(&path).unwrap();
    assert_eq!((reloaded.width(), reloaded.height()), (413, 531));
}

#[test]
fn no_face_fallback_still_produces_compliant_photo() {
    let us = get_standard(Some("us")).unwrap();
    let portrait = synthetic_portrait(
        900,
        700,
        FaceBox {
            x: 350,
            y: 200,
            width: 200,
            height: 250,
        },
    );

    let photo = prepare_passport_photo(
        &portrait,
        None,
        true,
        us,
        &vision::NoopFaceDetector,
        &FlatBackgroundSegmenter::default(),
    )
    .unwrap();

    assert_eq!(photo.image.dimensions(), (600, 600));
}

#[test]
fn flat_segmenter_is_usable_end_to_end() {
    // Direct trait usage outside the pipeline, as an embedding would do.
    let portrait = synthetic_portrait(
        700,
        700,
        FaceBox {
            x: 250,
            y: 200,
            width: 200,
            height: 250,
        },
    );
    let mask = FlatBackgroundSegmenter::default()
        .segment(&portrait.to_rgb8())
        .unwrap();
    assert_eq!(mask.dimensions(), (700, 700));
    // Border is background, head center is foreground.
    assert!(mask.get_pixel(1, 1).0[0] < 30);
    assert!(mask.get_pixel(350, 325).0[0] > 200);
}
