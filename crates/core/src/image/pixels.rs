//! Bit-depth-aware pixel storage.
//!
//! Samples are packed MSB first, channels interleaved, and every row starts on
//! a byte boundary. This is the layout of PDF image data, PNG scanlines (minus
//! the filter byte) and uncompressed TIFF strips alike, so a buffer's bytes
//! can be handed to either encoder without repacking.

use smallvec::SmallVec;

use crate::utils::{max_sample, read_bits, row_stride, write_bits};

/// One pixel's channel values. Inline up to CMYK plus alpha.
pub type Pixel = SmallVec<[u16; 5]>;

/// Valid sample depths.
pub const SUPPORTED_DEPTHS: [u32; 5] = [1, 2, 4, 8, 16];

/// A width x height raster of `channels` samples of `bits` bits each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bits: u32,
    channels: usize,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zero-filled buffer.
    ///
    /// # Panics
    /// Panics if `bits` is not 1, 2, 4, 8 or 16, or `channels` is zero.
    pub fn new(width: u32, height: u32, bits: u32, channels: usize) -> Self {
        let len = Self::byte_len(width, height, bits, channels);
        Self::from_bytes(width, height, bits, channels, vec![0; len])
    }

    /// Wrap existing packed sample data.
    ///
    /// # Panics
    /// Panics on an unsupported depth, zero channels, or if `data` is not
    /// exactly [`PixelBuffer::byte_len`] bytes long.
    pub fn from_bytes(width: u32, height: u32, bits: u32, channels: usize, data: Vec<u8>) -> Self {
        assert!(SUPPORTED_DEPTHS.contains(&bits), "unsupported depth {bits}");
        assert!(channels > 0, "pixel buffer needs at least one channel");
        let stride = row_stride(width as usize, channels, bits);
        assert_eq!(
            data.len(),
            stride * height as usize,
            "sample buffer does not match {width}x{height}x{channels}@{bits}"
        );
        Self {
            width,
            height,
            bits,
            channels,
            stride,
            data,
        }
    }

    /// Bytes needed for a buffer of the given shape.
    pub const fn byte_len(width: u32, height: u32, bits: u32, channels: usize) -> usize {
        row_stride(width as usize, channels, bits) * height as usize
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bits per channel sample.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Bytes per row.
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Largest value a sample can hold.
    pub const fn max_value(&self) -> u16 {
        max_sample(self.bits) as u16
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Packed bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Iterate over all rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks(self.stride.max(1)).take(self.height as usize)
    }

    fn bit_offset(&self, x: u32, y: u32, channel: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{}",
            self.width,
            self.height
        );
        y as usize * self.stride * 8
            + (x as usize * self.channels + channel) * self.bits as usize
    }

    /// Read one channel of one pixel.
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> u16 {
        assert!(channel < self.channels, "channel {channel} out of range");
        read_bits(&self.data, self.bit_offset(x, y, channel), self.bits) as u16
    }

    /// Write one channel of one pixel.
    pub fn set_sample(&mut self, x: u32, y: u32, channel: usize, value: u16) {
        assert!(channel < self.channels, "channel {channel} out of range");
        assert!(
            value <= self.max_value(),
            "sample {value} exceeds {} bits",
            self.bits
        );
        let offset = self.bit_offset(x, y, channel);
        write_bits(&mut self.data, offset, self.bits, value as u32);
    }

    /// Read all channels of the pixel at `(x, y)`.
    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        (0..self.channels).map(|c| self.sample(x, y, c)).collect()
    }

    /// Overwrite all channels of the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `pixel.len() != channels`, a value does not fit in `bits`,
    /// or the coordinate is out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: &[u16]) {
        assert_eq!(pixel.len(), self.channels, "pixel width mismatch");
        for (c, &value) in pixel.iter().enumerate() {
            self.set_sample(x, y, c, value);
        }
    }

    /// Apply `f` to every pixel, producing a buffer with a new shape.
    pub fn map_pixels(
        &self,
        bits: u32,
        channels: usize,
        mut f: impl FnMut(&[u16], &mut Pixel),
    ) -> Self {
        let mut out = Self::new(self.width, self.height, bits, channels);
        let mut dst = Pixel::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let src = self.get_pixel(x, y);
                dst.clear();
                f(&src, &mut dst);
                out.set_pixel(x, y, &dst);
            }
        }
        out
    }
}
