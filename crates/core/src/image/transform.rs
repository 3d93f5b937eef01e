//! Whole-image sample transformations.
//!
//! A resolved plan lists these in the order they must run: decode-array
//! rescale, de-indexing, tint transform, depth promotion. Each step consumes a
//! [`PixelBuffer`] and returns a new one.

use tracing::{debug, warn};

use crate::error::{PdfError, Result};
use crate::image::palette::Palette;
use crate::image::pixels::{Pixel, PixelBuffer};
use crate::model::function::FunctionHandle;
use crate::utils::max_sample;

/// Per-channel `/Decode` ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeArray {
    ranges: Vec<(f64, f64)>,
    /// Index-valued samples: ranges are in index units, not `[0, 1]`.
    indexed: bool,
}

impl DecodeArray {
    /// Pair up a flat `[lo0 hi0 lo1 hi1 ...]` array.
    ///
    /// Returns `None` (and logs) when the length is not `2 * channels`.
    pub fn new(values: &[f64], channels: usize, indexed: bool) -> Option<Self> {
        if values.len() != 2 * channels {
            warn!(
                len = values.len(),
                channels, "ignoring decode array of the wrong length"
            );
            return None;
        }
        let ranges = values.chunks(2).map(|pair| (pair[0], pair[1])).collect();
        Some(Self { ranges, indexed })
    }

    /// The `[1 0]` array that swaps black and white in a one-channel image.
    pub fn inverting() -> Self {
        Self {
            ranges: vec![(1.0, 0.0)],
            indexed: false,
        }
    }

    pub fn ranges(&self) -> &[(f64, f64)] {
        &self.ranges
    }

    /// True when applying the array would leave every sample unchanged.
    pub fn is_neutral(&self, bits: u32) -> bool {
        let identity = if self.indexed {
            (0.0, max_sample(bits) as f64)
        } else {
            (0.0, 1.0)
        };
        self.ranges.iter().all(|&range| range == identity)
    }

    /// Map one raw sample of `channel` through its range.
    pub fn map_sample(&self, channel: usize, value: u16, bits: u32) -> u16 {
        let max = max_sample(bits) as f64;
        let (lo, hi) = self.ranges[channel];
        let v = value as f64;
        let mapped = if self.indexed {
            lo + v * (hi - lo) / max
        } else {
            lo * max + v * (hi - lo)
        };
        mapped.floor().clamp(0.0, max) as u16
    }
}

/// One step of the transformation chain.
#[derive(Debug, Clone)]
pub enum Transformation {
    /// Remap raw samples through a decode array.
    DecodeRescale(DecodeArray),
    /// Replace each index with its palette entry, at 8 bits per component.
    Deindex(Palette),
    /// Evaluate a Separation tint transform per pixel, at 8 bits per component.
    TintTransform(FunctionHandle),
    /// Scale samples up to a wider depth, preserving full range.
    PromoteDepth { bits: u32 },
}

impl Transformation {
    /// Short name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DecodeRescale(_) => "decode",
            Self::Deindex(_) => "deindex",
            Self::TintTransform(_) => "tint",
            Self::PromoteDepth { .. } => "promote",
        }
    }

    /// Run this step over a whole image.
    pub fn apply(&self, buf: PixelBuffer) -> Result<PixelBuffer> {
        debug!(
            step = self.name(),
            width = buf.width(),
            height = buf.height(),
            bits = buf.bits(),
            channels = buf.channels(),
            "applying transformation"
        );
        match self {
            Self::DecodeRescale(decode) => {
                if decode.ranges().len() != buf.channels() {
                    return Err(PdfError::InvalidImage(format!(
                        "decode array covers {} channels, image has {}",
                        decode.ranges().len(),
                        buf.channels()
                    )));
                }
                let bits = buf.bits();
                Ok(buf.map_pixels(bits, buf.channels(), |src, dst| {
                    dst.extend(
                        src.iter()
                            .enumerate()
                            .map(|(c, &v)| decode.map_sample(c, v, bits)),
                    );
                }))
            }
            Self::Deindex(palette) => {
                expect_single_channel(&buf, "de-indexing")?;
                let n = palette.base_components();
                Ok(buf.map_pixels(8, n, |src, dst| {
                    dst.extend(palette.lookup(src[0]).iter().map(|&b| b as u16));
                }))
            }
            Self::TintTransform(function) => {
                expect_single_channel(&buf, "tint transform")?;
                let n = function.output_count();
                let max = buf.max_value();
                // Sample values repeat heavily; evaluate each distinct tint once.
                let mut cache: Vec<Option<Pixel>> = vec![None; max as usize + 1];
                Ok(buf.map_pixels(8, n, |src, dst| {
                    let tint = src[0];
                    let entry = cache[tint as usize].get_or_insert_with(|| {
                        let outputs = function.evaluate(&[tint as f64 / max as f64]);
                        let mut pixel: Pixel = outputs
                            .iter()
                            .take(n)
                            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u16)
                            .collect();
                        pixel.resize(n, 0);
                        pixel
                    });
                    dst.extend_from_slice(entry);
                }))
            }
            Self::PromoteDepth { bits } => {
                let from = buf.max_value() as u32;
                let to = max_sample(*bits);
                Ok(buf.map_pixels(*bits, buf.channels(), |src, dst| {
                    dst.extend(src.iter().map(|&v| (v as u32 * to / from) as u16));
                }))
            }
        }
    }
}

/// Run every step in order.
pub fn apply_all(buf: PixelBuffer, steps: &[Transformation]) -> Result<PixelBuffer> {
    steps.iter().try_fold(buf, |buf, step| step.apply(buf))
}

fn expect_single_channel(buf: &PixelBuffer, what: &str) -> Result<()> {
    if buf.channels() != 1 {
        return Err(PdfError::InvalidImage(format!(
            "{what} needs a single-channel image, got {} channels",
            buf.channels()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::color::ColorSpaceDescriptor;
    use crate::model::function::FnFunction;

    #[test]
    fn test_decode_inverts_gray() {
        let buf = PixelBuffer::from_bytes(3, 1, 8, 1, vec![0, 100, 255]);
        let out = Transformation::DecodeRescale(DecodeArray::inverting())
            .apply(buf)
            .unwrap();
        assert_eq!(out.as_bytes(), &[255, 155, 0]);
    }

    #[test]
    fn test_decode_neutral_detection() {
        let plain = DecodeArray::new(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0], 3, false).unwrap();
        assert!(plain.is_neutral(8));
        let indexed = DecodeArray::new(&[0.0, 15.0], 1, true).unwrap();
        assert!(indexed.is_neutral(4));
        assert!(!indexed.is_neutral(8));
        assert!(DecodeArray::new(&[0.0, 1.0], 3, false).is_none());
    }

    #[test]
    fn test_decode_indexed_units() {
        let decode = DecodeArray::new(&[15.0, 0.0], 1, true).unwrap();
        assert_eq!(decode.map_sample(0, 0, 4), 15);
        assert_eq!(decode.map_sample(0, 15, 4), 0);
        assert_eq!(decode.map_sample(0, 5, 4), 10);
    }

    #[test]
    fn test_decode_clamps_out_of_range() {
        let decode = DecodeArray::new(&[0.5, 2.0], 1, false).unwrap();
        assert_eq!(decode.map_sample(0, 255, 8), 255);
        assert_eq!(decode.map_sample(0, 0, 8), 127);
    }

    #[test]
    fn test_deindex_expands_to_base() {
        let palette = Palette::new(ColorSpaceDescriptor::DeviceRGB, 2, 2, vec![
            255, 0, 0, 0, 255, 0, 0, 0, 255,
        ])
        .unwrap();
        // Indices 0, 1, 2, 3 at 2 bits: 0b00_01_10_11
        let buf = PixelBuffer::from_bytes(4, 1, 2, 1, vec![0b0001_1011]);
        let out = Transformation::Deindex(palette).apply(buf).unwrap();
        assert_eq!(out.bits(), 8);
        assert_eq!(out.channels(), 3);
        assert_eq!(
            out.as_bytes(),
            &[255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 255]
        );
    }

    #[test]
    fn test_tint_transform_maps_to_rgb() {
        let red_ink = FunctionHandle::new(FnFunction::new(3, |x: &[f64]| {
            vec![1.0, 1.0 - x[0], 1.0 - x[0]]
        }));
        let buf = PixelBuffer::from_bytes(2, 1, 8, 1, vec![0, 255]);
        let out = Transformation::TintTransform(red_ink).apply(buf).unwrap();
        assert_eq!(out.as_bytes(), &[255, 255, 255, 255, 0, 0]);
    }

    #[test]
    fn test_promote_depth_full_range() {
        let buf = PixelBuffer::from_bytes(4, 1, 2, 1, vec![0b0001_1011]);
        let out = Transformation::PromoteDepth { bits: 8 }.apply(buf).unwrap();
        assert_eq!(out.as_bytes(), &[0, 85, 170, 255]);
    }

    #[test]
    fn test_deindex_rejects_multichannel() {
        let palette = Palette::new(ColorSpaceDescriptor::DeviceGray, 8, 0, vec![7]).unwrap();
        let buf = PixelBuffer::new(1, 1, 8, 3);
        assert!(Transformation::Deindex(palette).apply(buf).is_err());
    }
}
