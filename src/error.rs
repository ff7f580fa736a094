//! Errors surfaced by document-wide operations (resize, crop, export)

use thiserror::Error;

/// Error returned by operations that touch the whole document
///
/// Gesture and per-annotation failures never produce this type; they are
/// contained where they happen and logged.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Crop selection rejected before any pixel was touched
    #[error("invalid crop selection: {0}")]
    InvalidCrop(String),
    /// Resize target rejected before any pixel was touched
    #[error("invalid resize target: {0}")]
    InvalidResize(String),
    /// The source image has no pixels
    #[error("image is empty")]
    EmptyImage,
    /// A raster surface of the requested size could not be allocated
    #[error("cannot allocate {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },
    /// Encoding the composed image failed
    #[error("failed to encode {format} output: {reason}")]
    Encode {
        format: &'static str,
        reason: String,
    },
}
