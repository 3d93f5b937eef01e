//! LZW stream codec using the weezl crate.
//!
//! PDF and TIFF share the LZW bitstream (MSB first, 8-bit alphabet) but differ
//! in when the code width grows: PDF's default EarlyChange=1 matches TIFF's
//! "early" switch, EarlyChange=0 switches one code later.

use crate::error::{PdfError, Result};
use weezl::{BitOrder, decode::Decoder, encode::Encoder};

/// Decode LZW-encoded data (PDF variant: MSB first, 8-bit).
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data with EarlyChange setting.
///
/// EarlyChange=1 is the PDF default and the TIFF size switch.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i32) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::new(BitOrder::Msb, 8)
    } else {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    // Lenient: corrupt tails yield the partial output decoded so far.
    let _ = decoder.into_vec(&mut output).decode(data);
    Ok(output)
}

/// Encode data as a TIFF LZW strip (Compression = 5).
///
/// The stream starts with a Clear code and ends with EndOfInformation, as
/// TIFF readers expect.
pub fn lzwencode_tiff(data: &[u8]) -> Result<Vec<u8>> {
    Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
        .encode(data)
        .map_err(|e| PdfError::EncodeError(format!("LZW: {e}")))
}
