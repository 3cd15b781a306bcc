//! Image I/O: decoding inputs and writing print-ready JPEG output.
//!
//! Output artifacts are JPEG at quality 95 with the JFIF density fields set
//! to the photo's DPI. The `image` crate's JPEG encoder does not expose
//! density, so the encoded bytes are post-processed: the APP0/JFIF segment
//! is located by walking JPEG markers and its units/density fields are
//! rewritten in place (or, if the encoder emitted no JFIF segment, a fresh
//! one is inserted right after SOI).

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::pipeline::ProcessedPhoto;

/// Lossy output quality, fixed by the output artifact contract.
const JPEG_QUALITY: u8 = 95;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("JPEG encode failed: {0}")]
    Encode(String),
}

/// Load an image from disk and decode it.
///
/// Format is inferred from content; all compiled-in decoders (JPEG, PNG,
/// TIFF, WebP) are accepted.
pub fn load_image(path: &Path) -> Result<DynamicImage, EncodeError> {
    ImageReader::open(path)
        .map_err(EncodeError::Io)?
        .with_guessed_format()
        .map_err(EncodeError::Io)?
        .decode()
        .map_err(|e| EncodeError::Decode {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Encode a processed photo as JPEG with its DPI in the JFIF header.
pub fn save_jpeg(photo: &ProcessedPhoto, path: &Path) -> Result<(), EncodeError> {
    let bytes = encode_jpeg(photo)?;
    let mut file = std::fs::File::create(path).map_err(EncodeError::Io)?;
    file.write_all(&bytes).map_err(EncodeError::Io)?;
    Ok(())
}

/// Encode to in-memory JPEG bytes with density metadata applied.
pub fn encode_jpeg(photo: &ProcessedPhoto) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    photo
        .image
        .write_with_encoder(encoder)
        .map_err(|e| EncodeError::Encode(e.to_string()))?;

    set_jfif_density(&mut bytes, photo.dpi);
    Ok(bytes)
}

// JFIF APP0 layout after the 2-byte marker and 2-byte length:
//   "JFIF\0", version (2), units (1), Xdensity (2 BE), Ydensity (2 BE), ...
const JFIF_ID: &[u8] = b"JFIF\0";
const UNITS_DPI: u8 = 1;

/// Rewrite the JFIF density fields of an encoded JPEG to `dpi` dots/inch.
///
/// Inserts a minimal APP0 segment after SOI when the encoder produced none.
fn set_jfif_density(bytes: &mut Vec<u8>, dpi: u32) {
    let dpi = dpi.min(u16::MAX as u32) as u16;
    let [hi, lo] = dpi.to_be_bytes();

    if let Some(at) = find_jfif_payload(bytes) {
        // at points at "JFIF\0"; units/density live 7 bytes further in.
        bytes[at + 7] = UNITS_DPI;
        bytes[at + 8] = hi;
        bytes[at + 9] = lo;
        bytes[at + 10] = hi;
        bytes[at + 11] = lo;
        return;
    }

    // No JFIF segment: insert one directly after SOI (FF D8).
    if bytes.len() < 2 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return;
    }
    let segment: [u8; 18] = [
        0xFF, 0xE0, // APP0
        0x00, 0x10, // length 16
        b'J', b'F', b'I', b'F', 0x00, // identifier
        0x01, 0x02, // version 1.2
        UNITS_DPI, hi, lo, hi, lo, // units + densities
        0x00, 0x00, // no thumbnail
    ];
    bytes.splice(2..2, segment);
}

/// Walk JPEG segments and return the offset of the APP0 JFIF identifier.
fn find_jfif_payload(data: &[u8]) -> Option<usize> {
    // SOI, then marker segments until SOS (which has no walkable length).
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if length < 2 || pos + 2 + length > data.len() {
            return None;
        }
        if marker == 0xE0 {
            let payload = &data[pos + 4..pos + 2 + length];
            if payload.len() >= JFIF_ID.len() + 7 && payload.starts_with(JFIF_ID) {
                return Some(pos + 4);
            }
        }
        pos += 2 + length;
    }
    None
}
