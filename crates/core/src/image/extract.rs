//! Pipeline driver: samples plus metadata in, PNG or TIFF bytes out.
//!
//! Control flow per image:
//! resolve plan -> unpack samples -> transformations -> soft-mask merge -> encode.
//! Every call owns all of its state, so independent images can run on
//! separate threads; [`extract_images`] does exactly that on a rayon pool.

use flate2::Compression;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{PdfError, Result};
use crate::image::mask::merge_soft_mask;
use crate::image::pixels::{PixelBuffer, SUPPORTED_DEPTHS};
use crate::image::png::{PngColorType, PngEncoder};
use crate::image::resolve::{OutputFormat, PlanRequest, resolve};
use crate::image::tiff::TiffEncoder;
use crate::image::transform::{DecodeArray, Transformation, apply_all};
use crate::image::xobject::{ImageInput, SoftMaskInput};

/// Largest sample buffer the pipeline will allocate by default.
pub const MAX_IMAGE_DECODED_BYTES: usize = 256 * 1024 * 1024;

/// Options for image extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// Turn an image's soft mask into an alpha channel.
    pub merge_soft_mask: bool,

    /// Map Separation images through their tint transform to RGB.
    pub apply_tint_transform: bool,

    /// Reject images whose sample buffers (before or after transformation)
    /// would exceed this many bytes.
    pub max_decoded_bytes: usize,

    /// zlib level for PNG data.
    pub compression: Compression,

    /// Worker threads for [`extract_images`]. None uses all cores.
    pub threads: Option<usize>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            merge_soft_mask: false,
            apply_tint_transform: false,
            max_decoded_bytes: MAX_IMAGE_DECODED_BYTES,
            compression: Compression::default(),
            threads: None,
        }
    }
}

/// Shape of an extracted image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Bits per channel in the encoded file.
    pub color_depth: u32,
    /// Channels in the encoded file, alpha included.
    pub channels: usize,
    pub has_alpha: bool,
    /// The input's decode array, as supplied.
    pub decode_array: Option<Vec<f64>>,
}

/// A finished raster file.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    pub metadata: ImageMetadata,
    pub format: OutputFormat,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    pub const fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Run the whole pipeline on one image.
pub fn extract_image(input: &ImageInput, options: &ExtractOptions) -> Result<ExtractedImage> {
    let merge = options.merge_soft_mask && input.soft_mask.is_some();
    let request = PlanRequest {
        merge_soft_mask: merge,
        apply_tint_transform: options.apply_tint_transform,
    };
    let plan = resolve(
        &input.color_space,
        input.bits_per_component,
        input.decode.as_deref(),
        request,
    )?;

    let output_len = checked_len(
        input.width,
        input.height,
        plan.bits_per_component,
        plan.output_channels(),
    );
    check_limit(output_len, options.max_decoded_bytes)?;

    let samples = unpack(
        input.width,
        input.height,
        input.bits_per_component,
        plan.source_channels,
        &input.data,
        options.max_decoded_bytes,
    )?;
    let mut pixels = apply_all(samples, &plan.transformations)?;

    if merge && let Some(mask) = &input.soft_mask {
        let alpha = unpack_mask(mask, options.max_decoded_bytes)?;
        pixels = merge_soft_mask(&pixels, &alpha)?;
    }

    let data = match plan.format {
        OutputFormat::Png => {
            let color_type = PngColorType::from_layout(
                pixels.channels(),
                plan.has_alpha,
                plan.palette.is_some(),
            )?;
            PngEncoder::new(options.compression).encode(
                &pixels,
                color_type,
                plan.icc_profile.as_deref(),
                plan.palette.as_deref(),
            )?
        }
        OutputFormat::Tiff => {
            TiffEncoder::new().encode(&pixels, plan.icc_profile.as_deref(), plan.has_alpha)?
        }
    };
    debug!(
        family = input.color_space.family(),
        format = plan.format.extension(),
        bytes = data.len(),
        "extracted image"
    );

    Ok(ExtractedImage {
        metadata: ImageMetadata {
            width: input.width,
            height: input.height,
            color_depth: pixels.bits(),
            channels: pixels.channels(),
            has_alpha: plan.has_alpha,
            decode_array: input.decode.clone(),
        },
        format: plan.format,
        data,
    })
}

/// Run [`extract_image`] over many images in parallel.
///
/// Results come back in input order; one image failing does not stop the
/// others.
pub fn extract_images(
    inputs: &[ImageInput],
    options: &ExtractOptions,
) -> Result<Vec<Result<ExtractedImage>>> {
    let thread_count = options.threads.unwrap_or_else(default_thread_count).max(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count)
        .build()
        .map_err(|e| PdfError::DecodeError(e.to_string()))?;

    Ok(pool.install(|| {
        inputs
            .par_iter()
            .map(|input| extract_image(input, options))
            .collect()
    }))
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Wrap raw sample bytes, padding short data with zeros and dropping extra.
fn unpack(
    width: u32,
    height: u32,
    bits: u32,
    channels: usize,
    data: &[u8],
    limit: usize,
) -> Result<PixelBuffer> {
    if !SUPPORTED_DEPTHS.contains(&bits) {
        return Err(PdfError::UnsupportedColorDepth { bits, channels });
    }
    let expected = checked_len(width, height, bits, channels);
    check_limit(expected, limit)?;
    let expected = expected.unwrap_or(usize::MAX);

    let mut samples = data[..data.len().min(expected)].to_vec();
    if samples.len() < expected {
        warn!(
            got = data.len(),
            expected, "sample data is short, padding with zeros"
        );
        samples.resize(expected, 0);
    } else if data.len() > expected {
        debug!(
            got = data.len(),
            expected, "ignoring trailing sample data"
        );
    }
    Ok(PixelBuffer::from_bytes(width, height, bits, channels, samples))
}

fn unpack_mask(mask: &SoftMaskInput, limit: usize) -> Result<PixelBuffer> {
    let alpha = unpack(
        mask.width,
        mask.height,
        mask.bits_per_component,
        1,
        &mask.data,
        limit,
    )?;
    match mask
        .decode
        .as_deref()
        .and_then(|d| DecodeArray::new(d, 1, false))
    {
        Some(decode) if !decode.is_neutral(mask.bits_per_component) => {
            Transformation::DecodeRescale(decode).apply(alpha)
        }
        _ => Ok(alpha),
    }
}

/// Bytes of a buffer with this shape, or `None` if that overflows `usize`.
fn checked_len(width: u32, height: u32, bits: u32, channels: usize) -> Option<usize> {
    (width as usize)
        .checked_mul(channels)?
        .checked_mul(bits as usize)?
        .div_ceil(8)
        .checked_mul(height as usize)
}

fn check_limit(len: Option<usize>, limit: usize) -> Result<()> {
    match len {
        Some(size) if size <= limit => Ok(()),
        size => Err(PdfError::ImageTooLarge {
            size: size.unwrap_or(usize::MAX),
            limit,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::color::ColorSpaceDescriptor;

    #[test]
    fn test_short_data_padded() {
        let buf = unpack(2, 2, 8, 1, &[1, 2, 3], usize::MAX).unwrap();
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 0]);
    }

    #[test]
    fn test_long_data_truncated() {
        let buf = unpack(1, 1, 8, 3, &[1, 2, 3, 4, 5], usize::MAX).unwrap();
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_size_limit() {
        let input = ImageInput::new(1000, 1000, 8, ColorSpaceDescriptor::DeviceRGB, Vec::new());
        let options = ExtractOptions {
            max_decoded_bytes: 1024,
            ..Default::default()
        };
        let err = extract_image(&input, &options).unwrap_err();
        assert!(matches!(err, PdfError::ImageTooLarge { size: 3_000_000, limit: 1024 }));
    }

    #[test]
    fn test_expansion_counts_against_limit() {
        // 1-bit indexed expands 24x once de-indexed to RGB.
        let cs = ColorSpaceDescriptor::Indexed {
            base: Box::new(ColorSpaceDescriptor::DeviceRGB),
            hival: 1,
            lookup: vec![10, 20, 30, 40, 50, 60],
        };
        let input = ImageInput::new(64, 64, 1, cs, vec![0; 512]).with_soft_mask(SoftMaskInput::new(
            64,
            64,
            8,
            vec![255; 4096],
        ));
        let options = ExtractOptions {
            merge_soft_mask: true,
            max_decoded_bytes: 8192,
            ..Default::default()
        };
        assert!(matches!(
            extract_image(&input, &options),
            Err(PdfError::ImageTooLarge { .. })
        ));
    }

    #[test]
    fn test_mask_ignored_unless_requested() {
        let input = ImageInput::new(1, 1, 8, ColorSpaceDescriptor::DeviceGray, vec![5])
            .with_soft_mask(SoftMaskInput::new(1, 1, 8, vec![9]));
        let image = extract_image(&input, &ExtractOptions::default()).unwrap();
        assert!(!image.metadata.has_alpha);
        assert_eq!(image.metadata.channels, 1);
    }

    #[test]
    fn test_soft_mask_decode_applied() {
        let mut mask = SoftMaskInput::new(2, 1, 8, vec![0, 255]);
        mask.decode = Some(vec![1.0, 0.0]);
        let alpha = unpack_mask(&mask, usize::MAX).unwrap();
        assert_eq!(alpha.as_bytes(), &[255, 0]);
    }
}
