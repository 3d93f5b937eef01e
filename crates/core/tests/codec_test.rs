//! Tests for the LZW and predictor codecs behind TIFF strips.

use pdfimage_core::codec::{
    lzwdecode, lzwdecode_with_earlychange, lzwencode_tiff, tiff_predictor_decode,
    tiff_predictor_encode,
};

// === LZW ===

#[test]
fn test_lzwdecode() {
    let input = b"\x80\x0b\x60\x50\x22\x0c\x0c\x85\x01";
    let expected = b"\x2d\x2d\x2d\x2d\x2d\x41\x2d\x2d\x2d\x42";
    assert_eq!(lzwdecode(input).unwrap(), expected);
}

#[test]
fn test_tiff_strip_decodes_with_early_change() {
    let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 253) as u8).collect();
    let encoded = lzwencode_tiff(&data).unwrap();
    assert_eq!(lzwdecode_with_earlychange(&encoded, 1).unwrap(), data);
}

#[test]
fn test_truncated_stream_is_lenient() {
    let data = vec![42u8; 1000];
    let encoded = lzwencode_tiff(&data).unwrap();
    let partial = lzwdecode(&encoded[..encoded.len() / 2]).unwrap();
    assert!(partial.len() < data.len());
    assert!(partial.iter().all(|&b| b == 42));
}

// === Predictor ===

#[test]
fn test_predictor_differences_per_channel() {
    let row = [10, 20, 30, 15, 25, 35];
    let encoded = tiff_predictor_encode(3, 2, 8, &row).unwrap();
    assert_eq!(encoded, vec![10, 20, 30, 5, 5, 5]);
}

#[test]
fn test_predictor_wraps() {
    let row = [200, 10];
    let encoded = tiff_predictor_encode(1, 2, 8, &row).unwrap();
    assert_eq!(encoded, vec![200, 66]);
    assert_eq!(tiff_predictor_decode(1, 2, 8, &encoded), row);
}

#[test]
fn test_predictor_sixteen_bit_is_word_wise() {
    // 0x01FF then 0x0200: the word difference is 1, not a per-byte difference.
    let row = [0x01, 0xFF, 0x02, 0x00];
    let encoded = tiff_predictor_encode(1, 2, 16, &row).unwrap();
    assert_eq!(encoded, vec![0x01, 0xFF, 0x00, 0x01]);
    assert_eq!(tiff_predictor_decode(1, 2, 16, &encoded), row);
}

#[test]
fn test_predictor_rows_are_independent() {
    let data = [5, 6, 7, 100, 101, 102];
    let encoded = tiff_predictor_encode(1, 3, 8, &data).unwrap();
    assert_eq!(encoded, vec![5, 1, 1, 100, 1, 1]);
}

#[test]
fn test_predictor_rejects_sub_byte_depth() {
    assert!(tiff_predictor_encode(1, 8, 1, &[0xAA]).is_err());
}
