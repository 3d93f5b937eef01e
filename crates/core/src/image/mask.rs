//! Soft-mask merging.

use crate::error::{PdfError, Result};
use crate::image::pixels::PixelBuffer;

/// Append `mask` to `base` as a trailing alpha channel.
///
/// The mask keeps its own depth until here. A shallower mask is scaled up by
/// `2^base / 2^mask`; a deeper one is shifted down to the base depth.
pub fn merge_soft_mask(base: &PixelBuffer, mask: &PixelBuffer) -> Result<PixelBuffer> {
    if mask.channels() != 1 {
        return Err(PdfError::InvalidImage(format!(
            "soft mask must have one channel, got {}",
            mask.channels()
        )));
    }
    if (mask.width(), mask.height()) != (base.width(), base.height()) {
        return Err(PdfError::DimensionMismatch {
            expected: (base.width(), base.height()),
            got: (mask.width(), mask.height()),
        });
    }

    let (base_bits, mask_bits) = (base.bits(), mask.bits());
    let rescale = |v: u16| -> u16 {
        if mask_bits <= base_bits {
            v << (base_bits - mask_bits)
        } else {
            v >> (mask_bits - base_bits)
        }
    };

    let channels = base.channels();
    let mut out = PixelBuffer::new(base.width(), base.height(), base_bits, channels + 1);
    for y in 0..base.height() {
        for x in 0..base.width() {
            let mut pixel = base.get_pixel(x, y);
            pixel.push(rescale(mask.sample(x, y, 0)));
            out.set_pixel(x, y, &pixel);
        }
    }
    Ok(out)
}
