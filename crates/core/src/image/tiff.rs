//! TIFF container writer.
//!
//! Produces a big-endian, single-strip, single-IFD file. The strip is run
//! through the horizontal-differencing predictor and then LZW compressed.
//! Photometric is always Separated since only CMYK-class images land here.
//!
//! Layout: header, strip data, out-of-line tag values, IFD.

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use crate::codec::lzw::lzwencode_tiff;
use crate::codec::predictor::tiff_predictor_encode;
use crate::error::{PdfError, Result};
use crate::image::pixels::PixelBuffer;

const IMAGE_WIDTH: u16 = 256;
const IMAGE_LENGTH: u16 = 257;
const BITS_PER_SAMPLE: u16 = 258;
const COMPRESSION: u16 = 259;
const PHOTOMETRIC: u16 = 262;
const STRIP_OFFSETS: u16 = 273;
const SAMPLES_PER_PIXEL: u16 = 277;
const ROWS_PER_STRIP: u16 = 278;
const STRIP_BYTE_COUNTS: u16 = 279;
const X_RESOLUTION: u16 = 282;
const Y_RESOLUTION: u16 = 283;
const PLANAR_CONFIG: u16 = 284;
const RESOLUTION_UNIT: u16 = 296;
const PREDICTOR: u16 = 317;
const EXTRA_SAMPLES: u16 = 338;
const ICC_PROFILE: u16 = 34675;

const COMPRESSION_LZW: u16 = 5;
const PHOTOMETRIC_SEPARATED: u16 = 5;
const PREDICTOR_NONE: u16 = 1;
const PREDICTOR_HORIZONTAL: u16 = 2;
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;
const RESOLUTION_UNIT_INCH: u16 = 2;
const DPI: u32 = 300;

const HEADER_LEN: u32 = 8;

/// A tag's value in one of the field types this writer uses.
#[derive(Debug, Clone)]
enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(u32, u32),
    Undefined(Vec<u8>),
}

impl TagValue {
    const fn field_type(&self) -> u16 {
        match self {
            Self::Short(_) => 3,
            Self::Long(_) => 4,
            Self::Rational(..) => 5,
            Self::Undefined(_) => 7,
        }
    }

    fn count(&self) -> u32 {
        match self {
            Self::Short(v) => v.len() as u32,
            Self::Long(v) => v.len() as u32,
            Self::Rational(..) => 1,
            Self::Undefined(v) => v.len() as u32,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Short(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Long(v) => v.iter().flat_map(|x| x.to_be_bytes()).collect(),
            Self::Rational(num, den) => [num.to_be_bytes(), den.to_be_bytes()].concat(),
            Self::Undefined(v) => v.clone(),
        }
    }
}

/// Serializes a finished [`PixelBuffer`] as a TIFF file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffEncoder;

impl TiffEncoder {
    pub const fn new() -> Self {
        Self
    }

    /// Encode `buf` as a complete TIFF file.
    ///
    /// When `has_alpha` is set, the last channel is tagged as unassociated
    /// alpha.
    pub fn encode(
        &self,
        buf: &PixelBuffer,
        icc_profile: Option<&[u8]>,
        has_alpha: bool,
    ) -> Result<Vec<u8>> {
        let channels = buf.channels();
        let bits = buf.bits();
        if has_alpha && channels < 2 {
            return Err(PdfError::EncodeError(
                "alpha needs at least one color channel".to_string(),
            ));
        }

        let (strip, predictor) = if matches!(bits, 8 | 16) {
            let differenced =
                tiff_predictor_encode(channels, buf.width() as usize, bits, buf.as_bytes())?;
            (lzwencode_tiff(&differenced)?, PREDICTOR_HORIZONTAL)
        } else {
            (lzwencode_tiff(buf.as_bytes())?, PREDICTOR_NONE)
        };
        let strip_len = u32::try_from(strip.len())
            .map_err(|_| PdfError::EncodeError(format!("strip of {} bytes", strip.len())))?;
        debug!(
            width = buf.width(),
            height = buf.height(),
            channels,
            bits,
            strip_len,
            "encoding TIFF"
        );

        let mut tags = vec![
            (IMAGE_WIDTH, TagValue::Long(vec![buf.width()])),
            (IMAGE_LENGTH, TagValue::Long(vec![buf.height()])),
            (BITS_PER_SAMPLE, TagValue::Short(vec![bits as u16; channels])),
            (COMPRESSION, TagValue::Short(vec![COMPRESSION_LZW])),
            (PHOTOMETRIC, TagValue::Short(vec![PHOTOMETRIC_SEPARATED])),
            (STRIP_OFFSETS, TagValue::Long(vec![HEADER_LEN])),
            (SAMPLES_PER_PIXEL, TagValue::Short(vec![channels as u16])),
            (ROWS_PER_STRIP, TagValue::Long(vec![buf.height()])),
            (STRIP_BYTE_COUNTS, TagValue::Long(vec![strip_len])),
            (X_RESOLUTION, TagValue::Rational(DPI, 1)),
            (Y_RESOLUTION, TagValue::Rational(DPI, 1)),
            (PLANAR_CONFIG, TagValue::Short(vec![1])),
            (RESOLUTION_UNIT, TagValue::Short(vec![RESOLUTION_UNIT_INCH])),
            (PREDICTOR, TagValue::Short(vec![predictor])),
        ];
        if has_alpha {
            tags.push((
                EXTRA_SAMPLES,
                TagValue::Short(vec![EXTRA_SAMPLE_UNASSOCIATED_ALPHA]),
            ));
        }
        if let Some(profile) = icc_profile {
            tags.push((ICC_PROFILE, TagValue::Undefined(profile.to_vec())));
        }
        tags.sort_by_key(|(tag, _)| *tag);

        let mut out = Vec::with_capacity(HEADER_LEN as usize + strip.len() + 512);
        out.extend_from_slice(b"MM");
        out.write_u16::<BigEndian>(42)?;
        // IFD offset, patched once the value area is laid out.
        out.write_u32::<BigEndian>(0)?;
        out.extend_from_slice(&strip);
        pad_to_word(&mut out);

        // Values over four bytes live between the strip and the IFD.
        let mut entries = Vec::with_capacity(tags.len());
        for (tag, value) in &tags {
            let bytes = value.to_bytes();
            let field = if bytes.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..bytes.len()].copy_from_slice(&bytes);
                u32::from_be_bytes(inline)
            } else {
                let offset = offset_of(&out)?;
                out.extend_from_slice(&bytes);
                pad_to_word(&mut out);
                offset
            };
            entries.push((*tag, value.field_type(), value.count(), field));
        }

        let ifd_offset = offset_of(&out)?;
        out[4..8].copy_from_slice(&ifd_offset.to_be_bytes());
        out.write_u16::<BigEndian>(entries.len() as u16)?;
        for (tag, field_type, count, field) in entries {
            out.write_u16::<BigEndian>(tag)?;
            out.write_u16::<BigEndian>(field_type)?;
            out.write_u32::<BigEndian>(count)?;
            out.write_u32::<BigEndian>(field)?;
        }
        // No further IFDs.
        out.write_u32::<BigEndian>(0)?;
        Ok(out)
    }
}

fn pad_to_word(out: &mut Vec<u8>) {
    if out.len() % 2 == 1 {
        out.push(0);
    }
}

fn offset_of(out: &[u8]) -> Result<u32> {
    u32::try_from(out.len()).map_err(|_| PdfError::EncodeError("TIFF exceeds 4 GiB".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(data: &[u8], at: usize) -> u16 {
        u16::from_be_bytes([data[at], data[at + 1]])
    }

    fn be32(data: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(data[at..at + 4].try_into().unwrap())
    }

    fn tag_list(tiff: &[u8]) -> Vec<u16> {
        let ifd = be32(tiff, 4) as usize;
        let count = be16(tiff, ifd) as usize;
        (0..count).map(|i| be16(tiff, ifd + 2 + i * 12)).collect()
    }

    #[test]
    fn test_header_and_sorted_tags() {
        let buf = PixelBuffer::new(2, 2, 8, 4);
        let tiff = TiffEncoder::new().encode(&buf, None, false).unwrap();
        assert_eq!(&tiff[..4], b"MM\0*");
        let tags = tag_list(&tiff);
        assert_eq!(tags.len(), 14);
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
        assert!(!tags.contains(&EXTRA_SAMPLES));
    }

    #[test]
    fn test_alpha_and_icc_tags() {
        let buf = PixelBuffer::new(1, 1, 8, 5);
        let tiff = TiffEncoder::new().encode(&buf, Some(&[9; 40][..]), true).unwrap();
        let tags = tag_list(&tiff);
        assert!(tags.contains(&EXTRA_SAMPLES));
        assert_eq!(tags.last(), Some(&ICC_PROFILE));
    }

    #[test]
    fn test_ifd_word_aligned() {
        let buf = PixelBuffer::new(3, 1, 8, 4);
        let tiff = TiffEncoder::new().encode(&buf, Some(&[1, 2, 3, 4, 5][..]), false).unwrap();
        assert_eq!(be32(&tiff, 4) % 2, 0);
    }
}
