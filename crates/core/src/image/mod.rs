//! Image extraction and transcoding.
//!
//! This module contains:
//! - `pixels`: bit-packed pixel storage
//! - `palette`: indexed-color lookup tables
//! - `resolve`: color space to extraction plan
//! - `transform`: decode, de-index, tint and depth transformations
//! - `mask`: soft-mask merging
//! - `png` / `tiff`: container writers
//! - `xobject`: image stream inputs
//! - `extract`: the pipeline driver
//! - `writer`: export to a directory

pub mod extract;
pub mod mask;
pub mod palette;
pub mod pixels;
pub mod png;
pub mod resolve;
pub mod tiff;
pub mod transform;
pub mod writer;
pub mod xobject;

pub use extract::{
    ExtractOptions, ExtractedImage, ImageMetadata, MAX_IMAGE_DECODED_BYTES, extract_image,
    extract_images,
};
pub use mask::merge_soft_mask;
pub use palette::Palette;
pub use pixels::{Pixel, PixelBuffer};
pub use png::{PngColorType, PngEncoder};
pub use resolve::{OutputFormat, PlanRequest, ResolutionPlan, resolve};
pub use tiff::TiffEncoder;
pub use transform::{DecodeArray, Transformation};
pub use writer::ImageWriter;
pub use xobject::{ImageInput, SoftMaskInput};
