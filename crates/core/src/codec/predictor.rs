//! TIFF Predictor 2 (horizontal differencing).
//!
//! Each sample in a row is stored as the difference from the same channel of
//! the previous pixel. Differences wrap modulo the sample width, so 16-bit
//! samples are differenced as big-endian `u16` values, not byte by byte.

use crate::error::{PdfError, Result};

/// Apply horizontal differencing to rows of `columns * colors` samples.
pub fn tiff_predictor_encode(
    colors: usize,
    columns: usize,
    bits_per_component: u32,
    data: &[u8],
) -> Result<Vec<u8>> {
    let row_len = columns * colors * bits_per_component as usize / 8;
    match bits_per_component {
        8 => Ok(map_rows(data, row_len, |row, out| {
            for i in 0..row.len() {
                let left = if i >= colors { row[i - colors] } else { 0 };
                out.push(row[i].wrapping_sub(left));
            }
        })),
        16 => Ok(map_rows(data, row_len, |row, out| {
            let step = colors * 2;
            for i in (0..row.len()).step_by(2) {
                let cur = be16(row, i);
                let left = if i >= step { be16(row, i - step) } else { 0 };
                out.extend_from_slice(&cur.wrapping_sub(left).to_be_bytes());
            }
        })),
        other => Err(PdfError::EncodeError(format!(
            "TIFF predictor needs 8 or 16 bits per sample, got {other}"
        ))),
    }
}

/// Undo horizontal differencing.
///
/// Depths other than 8 and 16 are returned unchanged.
pub fn tiff_predictor_decode(
    colors: usize,
    columns: usize,
    bits_per_component: u32,
    data: &[u8],
) -> Vec<u8> {
    let row_len = columns * colors * bits_per_component as usize / 8;
    match bits_per_component {
        8 => map_rows(data, row_len, |row, out| {
            let start = out.len();
            for i in 0..row.len() {
                let mut v = row[i];
                if i >= colors {
                    v = v.wrapping_add(out[start + i - colors]);
                }
                out.push(v);
            }
        }),
        16 => map_rows(data, row_len, |row, out| {
            let start = out.len();
            let step = colors * 2;
            for i in (0..row.len()).step_by(2) {
                let mut v = be16(row, i);
                if i >= step {
                    v = v.wrapping_add(be16(out, start + i - step));
                }
                out.extend_from_slice(&v.to_be_bytes());
            }
        }),
        _ => data.to_vec(),
    }
}

fn map_rows(data: &[u8], row_len: usize, mut f: impl FnMut(&[u8], &mut Vec<u8>)) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    if row_len == 0 {
        return out;
    }
    for row in data.chunks(row_len) {
        f(row, &mut out);
    }
    out
}

fn be16(data: &[u8], i: usize) -> u16 {
    let hi = data[i];
    let lo = data.get(i + 1).copied().unwrap_or(0);
    u16::from_be_bytes([hi, lo])
}
