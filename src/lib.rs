//! # idphoto
//!
//! Passport and visa photo generator. Takes an arbitrary portrait photo and
//! produces a standards-compliant result: cropped to the required aspect
//! ratio (optionally centered on a detected face), background replaced with
//! solid white, resized to the exact pixel/DPI target, and optionally tiled
//! onto a printable 4x6 sheet.
//!
//! # Architecture
//!
//! The core is deterministic numeric logic over in-memory images; the two
//! model-shaped problems (face detection, background segmentation) sit
//! behind capability traits and are swappable:
//!
//! ```text
//! standards  →  geometry  →  pipeline  →  encode
//!                  ↑            ↑
//!               vision (FaceDetector / BackgroundSegmenter)
//!               sheet  (grid packing over standards)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`standards`] | Static registry of per-country photo standards (size, DPI, face padding, sheet config) |
//! | [`geometry`] | Pure crop math: face-centered crop suggestion, bounds clamping |
//! | [`vision`] | Collaborator traits for face detection and background segmentation, plus model-free defaults |
//! | [`pipeline`] | validate → crop → white background → DPI tag |
//! | [`sheet`] | Row-major grid packing of photo copies onto a printable canvas |
//! | [`encode`] | Decoding inputs, JPEG output at quality 95 with JFIF density set |
//!
//! # Design Decisions
//!
//! ## Registry as Constant Data
//!
//! Standards are compiled-in values behind a `LazyLock` map: populated once,
//! read-only forever. No configuration files, no runtime registration. A new
//! country is a new entry in `standards.rs`.
//!
//! ## Models Behind Traits
//!
//! Face detection and matting quality is a model problem; crop geometry and
//! sheet layout are not. Keeping the models behind [`vision::FaceDetector`]
//! and [`vision::BackgroundSegmenter`] means the numeric core is fully
//! testable with scripted fakes, and a real detector or matting network can
//! be wired in without touching the pipeline. The shipped defaults degrade
//! gracefully: no detector means center-fit cropping, and the border-sampling
//! segmenter handles photos shot against a plain backdrop.
//!
//! ## Clamp by Translation
//!
//! When a face-centered crop runs off the image, the box is shifted back
//! inside rather than shrunk, preserving the standard's aspect ratio whenever
//! the image is large enough. See [`geometry::suggest_crop`] for the ordering
//! constraint this imposes.

pub mod encode;
pub mod geometry;
pub mod pipeline;
pub mod sheet;
pub mod standards;
pub mod vision;
