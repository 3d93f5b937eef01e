//! PNG container writer.
//!
//! Emits signature, `IHDR`, optional `iCCP`, optional `PLTE`, one or more
//! `IDAT` chunks and `IEND`. Scanlines use filter type 0; the whole stream is
//! a single zlib stream split across `IDAT` chunks.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::Crc;
use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::error::{PdfError, Result};
use crate::image::pixels::PixelBuffer;

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const IDAT_CHUNK_SIZE: usize = 256 * 1024;
const ICC_PROFILE_NAME: &[u8] = b"ICC Profile";

/// PNG color types this pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PngColorType {
    Grayscale = 0,
    Rgb = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    Rgba = 6,
}

impl PngColorType {
    /// Pick the color type for `channels` samples per pixel (alpha included).
    pub fn from_layout(channels: usize, has_alpha: bool, has_palette: bool) -> Result<Self> {
        match (channels, has_alpha, has_palette) {
            (1, false, true) => Ok(Self::Indexed),
            (1, false, false) => Ok(Self::Grayscale),
            (2, true, false) => Ok(Self::GrayscaleAlpha),
            (3, false, false) => Ok(Self::Rgb),
            (4, true, false) => Ok(Self::Rgba),
            _ => Err(PdfError::EncodeError(format!(
                "no PNG color type for {channels} channel(s) \
                 (alpha: {has_alpha}, palette: {has_palette})"
            ))),
        }
    }

    pub const fn channels(self) -> usize {
        match self {
            Self::Grayscale | Self::Indexed => 1,
            Self::GrayscaleAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    const fn allows_depth(self, bits: u32) -> bool {
        match self {
            Self::Grayscale => matches!(bits, 1 | 2 | 4 | 8 | 16),
            Self::Indexed => matches!(bits, 1 | 2 | 4 | 8),
            Self::Rgb | Self::GrayscaleAlpha | Self::Rgba => matches!(bits, 8 | 16),
        }
    }
}

/// Serializes a finished [`PixelBuffer`] as a PNG file.
#[derive(Debug, Clone, Copy)]
pub struct PngEncoder {
    compression: Compression,
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl PngEncoder {
    pub const fn new(compression: Compression) -> Self {
        Self { compression }
    }

    /// Encode `buf` as a complete PNG file.
    ///
    /// `palette` holds RGB triplets and is required for [`PngColorType::Indexed`].
    pub fn encode(
        &self,
        buf: &PixelBuffer,
        color_type: PngColorType,
        icc_profile: Option<&[u8]>,
        palette: Option<&[u8]>,
    ) -> Result<Vec<u8>> {
        if buf.channels() != color_type.channels() {
            return Err(PdfError::EncodeError(format!(
                "{color_type:?} needs {} channel(s), image has {}",
                color_type.channels(),
                buf.channels()
            )));
        }
        if !color_type.allows_depth(buf.bits()) {
            return Err(PdfError::EncodeError(format!(
                "{color_type:?} does not allow {}-bit samples",
                buf.bits()
            )));
        }

        let mut out = Vec::with_capacity(buf.as_bytes().len() / 2 + 1024);
        out.extend_from_slice(SIGNATURE);
        self.write_ihdr(&mut out, buf, color_type)?;
        if let Some(profile) = icc_profile {
            self.write_iccp(&mut out, profile)?;
        }
        match (color_type, palette) {
            (PngColorType::Indexed, Some(palette)) => write_plte(&mut out, palette)?,
            (PngColorType::Indexed, None) => {
                return Err(PdfError::EncodeError(
                    "indexed PNG needs a palette".to_string(),
                ));
            }
            // A palette on a truecolor image is only a suggestion; drop it.
            _ => {}
        }
        self.write_idat(&mut out, buf)?;
        write_chunk(&mut out, b"IEND", &[])?;
        Ok(out)
    }

    fn write_ihdr(
        &self,
        out: &mut Vec<u8>,
        buf: &PixelBuffer,
        color_type: PngColorType,
    ) -> Result<()> {
        let mut ihdr = Vec::with_capacity(13);
        ihdr.write_u32::<BigEndian>(buf.width())?;
        ihdr.write_u32::<BigEndian>(buf.height())?;
        ihdr.push(buf.bits() as u8);
        ihdr.push(color_type as u8);
        // Compression, filter and interlace methods.
        ihdr.extend_from_slice(&[0, 0, 0]);
        write_chunk(out, b"IHDR", &ihdr)
    }

    fn write_iccp(&self, out: &mut Vec<u8>, profile: &[u8]) -> Result<()> {
        let mut data = Vec::with_capacity(ICC_PROFILE_NAME.len() + 2 + profile.len() / 2);
        data.extend_from_slice(ICC_PROFILE_NAME);
        data.push(0);
        // Compression method: zlib.
        data.push(0);
        data.extend_from_slice(&self.deflate(profile)?);
        write_chunk(out, b"iCCP", &data)
    }

    fn write_idat(&self, out: &mut Vec<u8>, buf: &PixelBuffer) -> Result<()> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression);
        for row in buf.rows() {
            encoder.write_all(&[0])?;
            encoder.write_all(row)?;
        }
        let compressed = encoder.finish()?;
        for chunk in compressed.chunks(IDAT_CHUNK_SIZE) {
            write_chunk(out, b"IDAT", chunk)?;
        }
        Ok(())
    }

    fn deflate(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

fn write_plte(out: &mut Vec<u8>, palette: &[u8]) -> Result<()> {
    if palette.is_empty() || palette.len() % 3 != 0 || palette.len() > 256 * 3 {
        return Err(PdfError::EncodeError(format!(
            "PLTE needs 1 to 256 RGB entries, got {} bytes",
            palette.len()
        )));
    }
    write_chunk(out, b"PLTE", palette)
}

/// Append one chunk: length, type, data, CRC-32 over type and data.
fn write_chunk(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) -> Result<()> {
    let len = u32::try_from(data.len())
        .map_err(|_| PdfError::EncodeError(format!("chunk of {} bytes", data.len())))?;
    out.write_u32::<BigEndian>(len)?;
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    let mut crc = Crc::new();
    crc.update(tag);
    crc.update(data);
    out.write_u32::<BigEndian>(crc.sum())?;
    Ok(())
}
