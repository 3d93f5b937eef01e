//! pdfimage - PDF image extraction and color-space transcoding.
//!
//! Takes the filter-decoded samples of a PDF image plus its color space,
//! depth, decode array and optional soft mask, and produces a standalone
//! PNG or TIFF file.

pub mod codec;
pub mod error;
pub mod image;
pub mod model;
pub mod utils;

// Re-export codec modules for convenience
pub use codec::lzw;
pub use codec::predictor;

// Re-export model modules under their PDF names
pub use model::color as pdfcolor;
pub use model::objects as pdftypes;

pub use error::{PdfError, Result};
pub use image::{
    ExtractOptions, ExtractedImage, ImageInput, ImageMetadata, ImageWriter, OutputFormat,
    extract_image, extract_images,
};
