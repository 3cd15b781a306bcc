//! Passport photo standard definitions for multiple countries.
//!
//! The registry is process-wide constant data: built once behind a
//! [`LazyLock`], keyed by lowercase code, never mutated at runtime. Each
//! [`PassportStandard`] describes the pixel/DPI target for one country's
//! format plus the [`SheetConfig`] used when tiling copies onto a printable
//! sheet.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StandardError {
    #[error("unknown passport standard '{code}'. Available: {}", .available.join(", "))]
    Unknown { code: String, available: Vec<String> },
}

/// How printable sheets are composed for a standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetConfig {
    /// Canvas size in pixels (width, height).
    pub canvas_size: (u32, u32),
    /// Uniform margin, in pixels, on all sides and between cells.
    pub margin_px: u32,
    /// Copies placed when the caller does not ask for a specific count.
    pub default_copies: u32,
    pub label: &'static str,
}

/// 4x6 inch portrait sheet at 300 DPI, two columns of 600px photos.
///
/// Margin is zero: 600 * 2 already fills the 1200px canvas width edge to
/// edge, so any horizontal gap would drop the sheet to one column.
const FOUR_BY_SIX: SheetConfig = SheetConfig {
    canvas_size: (1200, 1800),
    margin_px: 0,
    default_copies: 4,
    label: "4x6 in sheet",
};

/// Pixel dimensions and metadata for one passport photo format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassportStandard {
    /// Unique short identifier, lowercase (`us`, `uk`, ...).
    pub code: &'static str,
    pub display_name: &'static str,
    pub width_px: u32,
    pub height_px: u32,
    pub dpi: u32,
    pub description: &'static str,
    /// Factor expanding a detected face box into a head-and-shoulders crop.
    /// Always >= 1.0.
    pub face_padding: f64,
    pub sheet: SheetConfig,
}

impl PassportStandard {
    pub fn size(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    /// Target width/height ratio.
    pub fn aspect_ratio(&self) -> f64 {
        self.width_px as f64 / self.height_px as f64
    }

    /// Human-readable physical + pixel dimensions, e.g.
    /// `2.00x2.00 in (600x600 px)`.
    pub fn formatted_dimensions(&self) -> String {
        let width_in = self.width_px as f64 / self.dpi as f64;
        let height_in = self.height_px as f64 / self.dpi as f64;
        format!(
            "{:.2}x{:.2} in ({}x{} px)",
            width_in, height_in, self.width_px, self.height_px
        )
    }
}

pub const DEFAULT_STANDARD_CODE: &str = "us";

const BUILTIN_STANDARDS: &[PassportStandard] = &[
    PassportStandard {
        code: "us",
        display_name: "United States (USCIS)",
        width_px: 600,
        height_px: 600,
        dpi: 300,
        description: "2x2 in photo for US passports and visas.",
        face_padding: 1.7,
        sheet: FOUR_BY_SIX,
    },
    PassportStandard {
        code: "india",
        display_name: "India",
        width_px: 600,
        height_px: 600,
        dpi: 300,
        description: "51x51 mm (2x2 in) photo widely accepted for Indian passport services.",
        face_padding: 1.7,
        sheet: FOUR_BY_SIX,
    },
    PassportStandard {
        code: "uk",
        display_name: "United Kingdom",
        width_px: 413,
        height_px: 531,
        dpi: 300,
        description: "35x45 mm photo used for UK passport applications.",
        face_padding: 1.9,
        sheet: FOUR_BY_SIX,
    },
];

// BTreeMap so `all_standards` and error listings come out code-sorted.
static REGISTRY: LazyLock<BTreeMap<&'static str, &'static PassportStandard>> =
    LazyLock::new(|| BUILTIN_STANDARDS.iter().map(|s| (s.code, s)).collect());

/// Retrieve a passport standard by code.
///
/// `None` or an empty code falls back to the default standard. Lookup is
/// case-insensitive; an unknown code fails with the list of valid codes.
pub fn get_standard(code: Option<&str>) -> Result<&'static PassportStandard, StandardError> {
    let code = match code {
        None | Some("") => return Ok(default_standard()),
        Some(c) => c,
    };

    let key = code.to_lowercase();
    REGISTRY
        .get(key.as_str())
        .copied()
        .ok_or_else(|| StandardError::Unknown {
            code: code.to_string(),
            available: REGISTRY.keys().map(|k| k.to_string()).collect(),
        })
}

pub fn default_standard() -> &'static PassportStandard {
    REGISTRY[DEFAULT_STANDARD_CODE]
}

/// All registered standards, sorted by code.
pub fn all_standards() -> impl Iterator<Item = &'static PassportStandard> {
    REGISTRY.values().copied()
}
