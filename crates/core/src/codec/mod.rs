//! Codec modules used when writing TIFF output.
//!
//! This module contains:
//! - `lzw`: LZW compression and decompression
//! - `predictor`: TIFF horizontal-differencing predictor

pub mod lzw;
pub mod predictor;

// Re-export main functions for convenience
pub use lzw::{lzwdecode, lzwdecode_with_earlychange, lzwencode_tiff};
pub use predictor::{tiff_predictor_decode, tiff_predictor_encode};
