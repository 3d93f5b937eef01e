//! Color-space resolution.
//!
//! [`resolve`] turns a color-space descriptor plus the image's depth and decode
//! array into a [`ResolutionPlan`]: the output container, the final channel
//! layout, and the ordered transformations that get the raw samples there.
//! It is a pure function; nothing here looks at sample data.

use tracing::debug;

use crate::error::{PdfError, Result};
use crate::image::palette::Palette;
use crate::image::pixels::SUPPORTED_DEPTHS;
use crate::image::transform::{DecodeArray, Transformation};
use crate::model::color::ColorSpaceDescriptor;
use crate::model::function::FunctionHandle;

/// Container an image is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Tiff,
}

impl OutputFormat {
    /// Pick the container for an image with `components` color components.
    pub const fn for_components(components: usize) -> Self {
        if components > 3 { Self::Tiff } else { Self::Png }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tif",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
        }
    }
}

/// What the caller wants done beyond a faithful copy of the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanRequest {
    /// A soft mask is present and should become an alpha channel.
    pub merge_soft_mask: bool,
    /// Separation images should be mapped through their tint transform.
    pub apply_tint_transform: bool,
}

/// The resolver's output.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub format: OutputFormat,
    /// Components per pixel in the raw sample data.
    pub source_channels: usize,
    /// Color channels after all transformations, alpha excluded.
    pub channels: usize,
    /// Bits per component after all transformations.
    pub bits_per_component: u32,
    /// A soft mask will be appended as a trailing alpha channel.
    pub has_alpha: bool,
    /// Steps to run, in order.
    pub transformations: Vec<Transformation>,
    /// RGB palette bytes for a PNG `PLTE` chunk.
    pub palette: Option<Vec<u8>>,
    /// ICC profile to embed.
    pub icc_profile: Option<Vec<u8>>,
}

impl ResolutionPlan {
    /// Channels in the encoded image, alpha included.
    pub const fn output_channels(&self) -> usize {
        self.channels + self.has_alpha as usize
    }

    fn finish(mut self, request: PlanRequest) -> Self {
        self.has_alpha = request.merge_soft_mask;
        if self.has_alpha && self.bits_per_component < 8 {
            self.transformations
                .push(Transformation::PromoteDepth { bits: 8 });
            self.bits_per_component = 8;
        }
        self
    }
}

/// Derive the extraction plan for an image.
///
/// `decode` is the image's `/Decode` array, if it has one.
pub fn resolve(
    cs: &ColorSpaceDescriptor,
    bits: u32,
    decode: Option<&[f64]>,
    request: PlanRequest,
) -> Result<ResolutionPlan> {
    if matches!(
        cs,
        ColorSpaceDescriptor::DeviceN { .. } | ColorSpaceDescriptor::Other(_)
    ) {
        return Err(PdfError::UnsupportedColorSpace(cs.family().to_string()));
    }
    if !SUPPORTED_DEPTHS.contains(&bits) {
        return Err(PdfError::UnsupportedColorDepth {
            bits,
            channels: cs.component_count(),
        });
    }

    let plan = match cs {
        ColorSpaceDescriptor::DeviceGray | ColorSpaceDescriptor::CalGray => {
            direct(1, bits, decode, None)?
        }
        ColorSpaceDescriptor::DeviceRGB | ColorSpaceDescriptor::CalRGB => {
            direct(3, bits, decode, None)?
        }
        ColorSpaceDescriptor::DeviceCMYK => direct(4, bits, decode, None)?,
        ColorSpaceDescriptor::Indexed { base, .. } => {
            resolve_indexed(cs, base, bits, decode, request)?
        }
        ColorSpaceDescriptor::Separation {
            alternate, tint, ..
        } => {
            if request.apply_tint_transform {
                resolve_tint(alternate, tint.as_ref(), bits, decode)?
            } else {
                direct(1, bits, decode, None)?
            }
        }
        ColorSpaceDescriptor::ICCBased { components, .. } => {
            if !matches!(components, 1 | 3 | 4) {
                return Err(PdfError::UnsupportedComponentCount(*components));
            }
            let profile = cs.icc_profile().map(<[u8]>::to_vec);
            direct(*components, bits, decode, profile)?
        }
        ColorSpaceDescriptor::DeviceN { .. } | ColorSpaceDescriptor::Other(_) => {
            return Err(PdfError::UnsupportedColorSpace(cs.family().to_string()));
        }
    };

    let plan = plan.finish(request);
    debug!(
        family = cs.family(),
        bits,
        format = plan.format.extension(),
        channels = plan.output_channels(),
        depth = plan.bits_per_component,
        steps = plan.transformations.len(),
        "resolved image plan"
    );
    Ok(plan)
}

/// Device, calibrated, ICC and untransformed Separation images: samples pass
/// through with at most a decode rescale.
fn direct(
    components: usize,
    bits: u32,
    decode: Option<&[f64]>,
    icc_profile: Option<Vec<u8>>,
) -> Result<ResolutionPlan> {
    if components > 1 && !matches!(bits, 8 | 16) {
        return Err(PdfError::UnsupportedColorDepth {
            bits,
            channels: components,
        });
    }
    let mut transformations = Vec::new();
    push_decode(&mut transformations, decode, components, bits, false);
    Ok(ResolutionPlan {
        format: OutputFormat::for_components(components),
        source_channels: components,
        channels: components,
        bits_per_component: bits,
        has_alpha: false,
        transformations,
        palette: None,
        icc_profile,
    })
}

fn resolve_indexed(
    cs: &ColorSpaceDescriptor,
    base: &ColorSpaceDescriptor,
    bits: u32,
    decode: Option<&[f64]>,
    request: PlanRequest,
) -> Result<ResolutionPlan> {
    if bits > 8 {
        return Err(PdfError::UnsupportedColorDepth { bits, channels: 1 });
    }
    let palette = Palette::from_descriptor(cs, bits)?;
    let mut transformations = Vec::new();
    let has_decode = push_decode(&mut transformations, decode, 1, bits, true);

    if bits == 1
        && let Some(white_first) = palette.black_white_order()
    {
        if white_first && !has_decode {
            transformations.push(Transformation::DecodeRescale(DecodeArray::inverting()));
        }
        return Ok(ResolutionPlan {
            format: OutputFormat::Png,
            source_channels: 1,
            channels: 1,
            bits_per_component: 1,
            has_alpha: false,
            transformations,
            palette: None,
            icc_profile: None,
        });
    }

    let components = palette.base_components();
    let icc_profile = base.icc_profile().map(<[u8]>::to_vec);
    // PNG palettes hold RGB triplets only, so gray and CMYK bases expand.
    if request.merge_soft_mask || components != 3 {
        transformations.push(Transformation::Deindex(palette));
        return Ok(ResolutionPlan {
            format: OutputFormat::for_components(components),
            source_channels: 1,
            channels: components,
            bits_per_component: 8,
            has_alpha: false,
            transformations,
            palette: None,
            icc_profile,
        });
    }

    Ok(ResolutionPlan {
        format: OutputFormat::Png,
        source_channels: 1,
        channels: 1,
        bits_per_component: bits,
        has_alpha: false,
        transformations,
        palette: Some(palette.data().to_vec()),
        icc_profile,
    })
}

fn resolve_tint(
    alternate: &ColorSpaceDescriptor,
    tint: Option<&FunctionHandle>,
    bits: u32,
    decode: Option<&[f64]>,
) -> Result<ResolutionPlan> {
    if !matches!(
        alternate,
        ColorSpaceDescriptor::DeviceRGB | ColorSpaceDescriptor::CalRGB
    ) {
        return Err(PdfError::UnsupportedAlternateSpace(
            alternate.family().to_string(),
        ));
    }
    if bits < 8 {
        return Err(PdfError::UnsupportedColorDepth { bits, channels: 1 });
    }
    let tint = tint.ok_or(PdfError::MissingTintTransform)?;
    if tint.output_count() != 3 {
        return Err(PdfError::MalformedColorSpace(format!(
            "tint transform yields {} components for an RGB alternate",
            tint.output_count()
        )));
    }
    let mut transformations = Vec::new();
    push_decode(&mut transformations, decode, 1, bits, false);
    transformations.push(Transformation::TintTransform(tint.clone()));
    Ok(ResolutionPlan {
        format: OutputFormat::Png,
        source_channels: 1,
        channels: 3,
        bits_per_component: 8,
        has_alpha: false,
        transformations,
        palette: None,
        icc_profile: None,
    })
}

/// Install a decode rescale unless the array is absent, malformed or neutral.
///
/// Returns whether the caller supplied a usable decode array.
fn push_decode(
    steps: &mut Vec<Transformation>,
    decode: Option<&[f64]>,
    components: usize,
    bits: u32,
    indexed: bool,
) -> bool {
    let Some(decode) = decode.and_then(|d| DecodeArray::new(d, components, indexed)) else {
        return false;
    };
    if !decode.is_neutral(bits) {
        steps.push(Transformation::DecodeRescale(decode));
    }
    true
}
