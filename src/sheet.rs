//! Arranging passport photos on printable sheets.
//!
//! A sheet is a white canvas holding N verbatim copies of one processed
//! photo. Placement is a deterministic row-major grid: same inputs, same
//! positions, no resampling of the pasted photo.

use crate::pipeline::ProcessedPhoto;
use crate::standards::PassportStandard;
use image::{Rgb, RgbImage, imageops};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error(
        "photo is {got_w}x{got_h} px but the {code} standard's sheet expects exactly \
         {want_w}x{want_h} px"
    )]
    SizeMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
        code: &'static str,
    },
    #[error("photo ({photo_w}x{photo_h} px) is larger than the sheet canvas ({canvas_w}x{canvas_h} px)")]
    PhotoLargerThanCanvas {
        photo_w: u32,
        photo_h: u32,
        canvas_w: u32,
        canvas_h: u32,
    },
    #[error("cannot place any copies: no cell fits on the canvas with a {margin}px margin")]
    NoCapacity { margin: u32 },
}

/// Compute row-major cell positions for photo copies on a canvas.
///
/// Cells start at `(margin, margin)` and advance by photo size plus margin,
/// left-to-right then top-to-bottom, while they stay inside the canvas minus
/// the margin on the far edges. Generation stops once `copies` positions
/// exist. Fails before any placement when the photo exceeds the canvas, and
/// when not a single cell fits.
pub fn generate_positions(
    canvas_size: (u32, u32),
    photo_size: (u32, u32),
    copies: u32,
    margin_px: u32,
) -> Result<Vec<(u32, u32)>, SheetError> {
    let (canvas_w, canvas_h) = canvas_size;
    let (photo_w, photo_h) = photo_size;

    if photo_w > canvas_w || photo_h > canvas_h {
        return Err(SheetError::PhotoLargerThanCanvas {
            photo_w,
            photo_h,
            canvas_w,
            canvas_h,
        });
    }

    let max_x = canvas_w.saturating_sub(margin_px);
    let max_y = canvas_h.saturating_sub(margin_px);

    let mut positions = Vec::new();
    let mut y = margin_px;
    'rows: while y + photo_h <= max_y {
        let mut x = margin_px;
        while x + photo_w <= max_x {
            if positions.len() as u32 >= copies {
                break 'rows;
            }
            positions.push((x, y));
            x += photo_w + margin_px;
        }
        y += photo_h + margin_px;
    }

    if positions.is_empty() {
        return Err(SheetError::NoCapacity { margin: margin_px });
    }
    Ok(positions)
}

/// Create a printable sheet containing multiple copies of a passport photo.
///
/// The photo must already be exactly the standard's pixel size; it is pasted
/// verbatim, never resampled. `copies` defaults to the standard's sheet
/// configuration. The result carries the standard's DPI for encoding.
pub fn create_passport_sheet(
    photo: &RgbImage,
    copies: Option<u32>,
    standard: &PassportStandard,
) -> Result<ProcessedPhoto, SheetError> {
    if photo.dimensions() != standard.size() {
        let (got_w, got_h) = photo.dimensions();
        return Err(SheetError::SizeMismatch {
            got_w,
            got_h,
            want_w: standard.width_px,
            want_h: standard.height_px,
            code: standard.code,
        });
    }

    let sheet = &standard.sheet;
    let copies = copies.unwrap_or(sheet.default_copies);

    let (canvas_w, canvas_h) = sheet.canvas_size;
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb([255, 255, 255]));

    let positions = generate_positions(sheet.canvas_size, photo.dimensions(), copies, sheet.margin_px)?;
    for &(x, y) in positions.iter().take(copies as usize) {
        imageops::replace(&mut canvas, photo, x as i64, y as i64);
    }

    Ok(ProcessedPhoto {
        image: canvas,
        dpi: standard.dpi,
    })
}
