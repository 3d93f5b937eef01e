//! Error types for the pdfimage extraction library.

use thiserror::Error;

/// Primary error type for image extraction operations.
///
/// The color-data variants (`Unsupported*`, `Malformed*`, `DimensionMismatch`)
/// are never retried inside the pipeline. Callers decide whether to skip the
/// image, fall back to the undecoded stream, or abort.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("encode error: {0}")]
    EncodeError(String),

    #[error("unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    #[error("unsupported color depth: {bits} bits per component with {channels} channel(s)")]
    UnsupportedColorDepth { bits: u32, channels: usize },

    #[error("unsupported ICC component count: {0}")]
    UnsupportedComponentCount(usize),

    #[error("unsupported Separation alternate space: {0}")]
    UnsupportedAlternateSpace(String),

    #[error("malformed palette: {0}")]
    MalformedPalette(String),

    #[error("malformed color space: {0}")]
    MalformedColorSpace(String),

    #[error("Separation color space has no usable tint transform")]
    MissingTintTransform,

    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    #[error("soft mask is {got:?} but image is {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },

    #[error("image too large: {size} bytes exceeds limit of {limit}")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;
