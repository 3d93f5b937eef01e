//! Miscellaneous routines shared by the pixel, function and codec code.
//!
//! Bit-packed data follows the raster convention used throughout PDF: the
//! most significant bit of each byte comes first.

/// Read `nbits` (1..=32) starting at `bit_offset`, MSB first.
///
/// Bits past the end of `data` read as zero.
pub fn read_bits(data: &[u8], bit_offset: usize, nbits: u32) -> u32 {
    debug_assert!((1..=32).contains(&nbits));
    if nbits == 8 && bit_offset % 8 == 0 {
        return data.get(bit_offset / 8).copied().unwrap_or(0) as u32;
    }
    let mut value: u64 = 0;
    let mut remaining = nbits;
    let mut pos = bit_offset;
    while remaining > 0 {
        let byte = data.get(pos / 8).copied().unwrap_or(0);
        let bit_in_byte = (pos % 8) as u32;
        let avail = 8 - bit_in_byte;
        let take = avail.min(remaining);
        let shift = avail - take;
        let bits = (byte >> shift) & (((1u16 << take) - 1) as u8);
        value = (value << take) | bits as u64;
        remaining -= take;
        pos += take as usize;
    }
    value as u32
}

/// Write the low `nbits` (1..=16) of `value` starting at `bit_offset`, MSB first.
pub fn write_bits(data: &mut [u8], bit_offset: usize, nbits: u32, value: u32) {
    debug_assert!((1..=16).contains(&nbits));
    if nbits == 8 && bit_offset % 8 == 0 {
        data[bit_offset / 8] = value as u8;
        return;
    }
    let mut remaining = nbits;
    let mut pos = bit_offset;
    while remaining > 0 {
        let bit_in_byte = (pos % 8) as u32;
        let avail = 8 - bit_in_byte;
        let take = avail.min(remaining);
        let shift = avail - take;
        let mask = ((((1u16 << take) - 1) as u8) << shift) as u8;
        let bits = (((value >> (remaining - take)) & ((1 << take) - 1)) as u8) << shift;
        let byte = &mut data[pos / 8];
        *byte = (*byte & !mask) | bits;
        remaining -= take;
        pos += take as usize;
    }
}

/// Bytes needed to hold one row of `width` samples of `channels * bits` bits.
pub const fn row_stride(width: usize, channels: usize, bits: u32) -> usize {
    (width * channels * bits as usize).div_ceil(8)
}

/// Largest sample value representable in `bits` bits.
pub const fn max_sample(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Linear interpolation of `x` from `[x0, x1]` onto `[y0, y1]`.
pub fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Clamp `x` into the interval spanned by `a` and `b`, in either order.
pub fn clamp_between(x: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    x.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_sub_byte() {
        let data = [0b1011_0010, 0b0111_0000];
        assert_eq!(read_bits(&data, 0, 1), 1);
        assert_eq!(read_bits(&data, 1, 1), 0);
        assert_eq!(read_bits(&data, 0, 4), 0b1011);
        assert_eq!(read_bits(&data, 4, 4), 0b0010);
        assert_eq!(read_bits(&data, 6, 4), 0b1001);
    }

    #[test]
    fn test_read_bits_wide() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_bits(&data, 0, 16), 0x1234);
        assert_eq!(read_bits(&data, 8, 16), 0x3456);
        assert_eq!(read_bits(&data, 4, 12), 0x234);
        assert_eq!(read_bits(&data, 0, 32), 0x1234_5678);
    }

    #[test]
    fn test_read_bits_past_end_is_zero() {
        assert_eq!(read_bits(&[0xFF], 8, 8), 0);
        assert_eq!(read_bits(&[0xFF], 4, 8), 0xF0);
    }

    #[test]
    fn test_write_bits_preserves_neighbours() {
        let mut data = [0xFF, 0xFF];
        write_bits(&mut data, 2, 4, 0b0000);
        assert_eq!(data, [0b1100_0011, 0xFF]);
        write_bits(&mut data, 6, 4, 0b1010);
        assert_eq!(data, [0b1100_0010, 0b10_11_1111]);
    }

    #[test]
    fn test_write_bits_sixteen() {
        let mut data = [0u8; 3];
        write_bits(&mut data, 8, 16, 0xABCD);
        assert_eq!(data, [0x00, 0xAB, 0xCD]);
    }

    #[test]
    fn test_row_stride_rounds_up() {
        assert_eq!(row_stride(10, 1, 1), 2);
        assert_eq!(row_stride(3, 3, 8), 9);
        assert_eq!(row_stride(3, 1, 4), 2);
        assert_eq!(row_stride(2, 4, 16), 16);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(0.5, 0.0, 1.0, 0.0, 255.0), 127.5);
        assert_eq!(interpolate(3.0, 3.0, 3.0, 7.0, 9.0), 7.0);
        assert_eq!(clamp_between(2.0, 1.0, 0.0), 1.0);
    }
}
