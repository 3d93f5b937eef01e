//! Indexed-color lookup tables.

use crate::error::{PdfError, Result};
use crate::model::color::ColorSpaceDescriptor;

/// An Indexed color space's lookup table.
#[derive(Debug, Clone)]
pub struct Palette {
    base: ColorSpaceDescriptor,
    index_bits: u32,
    hival: u8,
    data: Vec<u8>,
}

impl Palette {
    /// Build a palette over `base`.
    ///
    /// `data` must hold `(hival + 1)` entries of one byte per base component.
    pub fn new(
        base: ColorSpaceDescriptor,
        index_bits: u32,
        hival: u8,
        data: Vec<u8>,
    ) -> Result<Self> {
        let n = base.component_count();
        if !matches!(n, 1 | 3 | 4) {
            return Err(PdfError::UnsupportedComponentCount(n));
        }
        let needed = (hival as usize + 1) * n;
        if data.len() < needed {
            return Err(PdfError::MalformedPalette(format!(
                "lookup has {} bytes, expected {}",
                data.len(),
                needed
            )));
        }
        let mut data = data;
        data.truncate(needed);
        Ok(Self {
            base,
            index_bits,
            hival,
            data,
        })
    }

    /// Build the palette of an Indexed descriptor read at `index_bits` per sample.
    pub fn from_descriptor(cs: &ColorSpaceDescriptor, index_bits: u32) -> Result<Self> {
        match cs {
            ColorSpaceDescriptor::Indexed {
                base,
                hival,
                lookup,
            } => Self::new(base.as_ref().clone(), index_bits, *hival, lookup.clone()),
            other => Err(PdfError::MalformedPalette(format!(
                "{} has no palette",
                other.family()
            ))),
        }
    }

    pub fn base(&self) -> &ColorSpaceDescriptor {
        &self.base
    }

    pub fn base_components(&self) -> usize {
        self.base.component_count()
    }

    pub const fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub const fn hival(&self) -> u8 {
        self.hival
    }

    /// Number of entries (`hival + 1`).
    pub fn entry_count(&self) -> usize {
        self.hival as usize + 1
    }

    /// Raw lookup bytes, one byte per base component per entry.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Base-space components for `index`. Indices past `hival` clamp to it.
    pub fn lookup(&self, index: u16) -> &[u8] {
        let n = self.base_components();
        let index = (index as usize).min(self.hival as usize);
        &self.data[index * n..(index + 1) * n]
    }

    /// For a two-entry black/white palette, whether entry 0 is the white one.
    ///
    /// Returns `None` unless the base is additive (1 or 3 components) and the
    /// first two entries are one pure black and one pure white.
    pub fn black_white_order(&self) -> Option<bool> {
        let n = self.base_components();
        if !matches!(n, 1 | 3) || self.entry_count() < 2 {
            return None;
        }
        let uniform = |entry: &[u8]| match entry {
            e if e.iter().all(|&b| b == 0) => Some(false),
            e if e.iter().all(|&b| b == 255) => Some(true),
            _ => None,
        };
        let first = uniform(self.lookup(0))?;
        let second = uniform(self.lookup(1))?;
        (first != second).then_some(first)
    }
}
