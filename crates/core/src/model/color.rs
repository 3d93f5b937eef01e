//! PDF color space descriptors.
//!
//! A [`ColorSpaceDescriptor`] is the immutable, fully-resolved form of an
//! image's `/ColorSpace` entry. Parsing only rejects structurally broken
//! input; families the pipeline cannot transcode (DeviceN, Lab, Pattern, ...)
//! are still represented so the resolver can reject them with a typed error.

use tracing::warn;

use crate::error::{PdfError, Result};
use crate::model::function::{FunctionHandle, function_from_object};
use crate::model::objects::{ObjectResolver, PDFObject};

/// Resolved PDF color space.
#[derive(Debug, Clone)]
pub enum ColorSpaceDescriptor {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB,
    /// `[/Indexed base hival lookup]`
    Indexed {
        base: Box<Self>,
        /// Maximum valid index, inclusive.
        hival: u8,
        /// Exactly `(hival + 1) * base.component_count()` bytes.
        lookup: Vec<u8>,
    },
    /// `[/Separation name alternate tintTransform]`
    Separation {
        name: String,
        alternate: Box<Self>,
        /// `None` when the tint transform could not be parsed.
        tint: Option<FunctionHandle>,
    },
    /// `[/ICCBased stream]`
    ICCBased { components: usize, profile: Vec<u8> },
    /// `[/DeviceN names alternate tint attrs?]`, including the NChannel subtype.
    DeviceN { components: usize, nchannel: bool },
    /// Any other family (Lab, Pattern, unknown names).
    Other(String),
}

impl ColorSpaceDescriptor {
    /// Look up a device or calibrated space by name, including inline
    /// image abbreviations.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DeviceGray" | "G" => Some(Self::DeviceGray),
            "DeviceRGB" | "RGB" => Some(Self::DeviceRGB),
            "DeviceCMYK" | "CMYK" => Some(Self::DeviceCMYK),
            "CalGray" => Some(Self::CalGray),
            "CalRGB" => Some(Self::CalRGB),
            _ => None,
        }
    }

    /// Build a descriptor from a `/ColorSpace` value (name or array).
    pub fn from_object(obj: &PDFObject, resolver: &dyn ObjectResolver) -> Result<Self> {
        let obj = resolver.resolve(obj)?;
        match &obj {
            PDFObject::Name(name) => {
                Ok(Self::from_name(name).unwrap_or_else(|| Self::Other(name.clone())))
            }
            PDFObject::Array(arr) => Self::from_array(arr, resolver),
            _ => Err(PdfError::MalformedColorSpace(
                "color space must be a name or an array".to_string(),
            )),
        }
    }

    fn from_array(arr: &[PDFObject], resolver: &dyn ObjectResolver) -> Result<Self> {
        let family = match arr.first() {
            Some(first) => resolver.resolve(first)?.as_name()?.to_string(),
            None => {
                return Err(PdfError::MalformedColorSpace(
                    "empty color space array".to_string(),
                ));
            }
        };

        match family.as_str() {
            "Indexed" | "I" => Self::parse_indexed(arr, resolver),
            "Separation" => Self::parse_separation(arr, resolver),
            "ICCBased" => Self::parse_icc(arr, resolver),
            "DeviceN" => Self::parse_device_n(arr, resolver),
            // [/CalRGB << ... >>] and friends; the calibration dictionary
            // does not change how samples are laid out.
            name => Ok(Self::from_name(name).unwrap_or(Self::Other(family.clone()))),
        }
    }

    fn parse_indexed(arr: &[PDFObject], resolver: &dyn ObjectResolver) -> Result<Self> {
        if arr.len() != 4 {
            return Err(PdfError::MalformedPalette(format!(
                "Indexed array has {} elements, expected 4",
                arr.len()
            )));
        }
        let base = Self::from_object(&arr[1], resolver)?;
        if matches!(base, Self::Indexed { .. }) {
            return Err(PdfError::MalformedPalette(format!(
                "{} cannot be a palette base",
                base.family()
            )));
        }
        let hival = resolver.resolve(&arr[2])?.as_int()?;
        let hival = u8::try_from(hival)
            .map_err(|_| PdfError::MalformedPalette(format!("hival {hival} outside 0..=255")))?;

        let lookup_obj = resolver.resolve(&arr[3])?;
        let mut lookup = match &lookup_obj {
            PDFObject::String(bytes) => bytes.clone(),
            PDFObject::Stream(stream) => stream.get_data().to_vec(),
            _ => {
                return Err(PdfError::MalformedPalette(
                    "lookup must be a string or stream".to_string(),
                ));
            }
        };
        let needed = (hival as usize + 1) * base.component_count();
        if lookup.len() < needed {
            return Err(PdfError::MalformedPalette(format!(
                "lookup has {} bytes, expected {}",
                lookup.len(),
                needed
            )));
        }
        lookup.truncate(needed);

        Ok(Self::Indexed {
            base: Box::new(base),
            hival,
            lookup,
        })
    }

    fn parse_separation(arr: &[PDFObject], resolver: &dyn ObjectResolver) -> Result<Self> {
        if arr.len() != 4 {
            return Err(PdfError::MalformedColorSpace(format!(
                "Separation array has {} elements, expected 4",
                arr.len()
            )));
        }
        let name = resolver
            .resolve(&arr[1])?
            .as_name()
            .map(str::to_string)
            .unwrap_or_default();
        let alternate = Self::from_object(&arr[2], resolver)?;
        let tint = match function_from_object(&arr[3], resolver) {
            Ok(function) => Some(function),
            Err(err) => {
                warn!(separation = %name, error = %err, "ignoring tint transform");
                None
            }
        };
        Ok(Self::Separation {
            name,
            alternate: Box::new(alternate),
            tint,
        })
    }

    fn parse_icc(arr: &[PDFObject], resolver: &dyn ObjectResolver) -> Result<Self> {
        let stream_obj = match arr.get(1) {
            Some(obj) => resolver.resolve(obj)?,
            None => {
                return Err(PdfError::MalformedColorSpace(
                    "ICCBased array without profile stream".to_string(),
                ));
            }
        };
        let stream = stream_obj.as_stream()?;
        let components = stream
            .get("N")
            .ok_or_else(|| {
                PdfError::MalformedColorSpace("ICC profile stream without /N".to_string())
            })?
            .as_int()?;
        let components = usize::try_from(components)
            .map_err(|_| PdfError::UnsupportedComponentCount(0))?;
        Ok(Self::ICCBased {
            components,
            profile: stream.get_data().to_vec(),
        })
    }

    fn parse_device_n(arr: &[PDFObject], resolver: &dyn ObjectResolver) -> Result<Self> {
        let components = match arr.get(1) {
            Some(obj) => resolver.resolve(obj)?.as_array()?.len(),
            None => 0,
        };
        let nchannel = match arr.get(4) {
            Some(obj) => resolver
                .resolve(obj)?
                .as_dict()
                .ok()
                .and_then(|d| d.get("Subtype"))
                .and_then(|s| s.as_name().ok())
                == Some("NChannel"),
            None => false,
        };
        Ok(Self::DeviceN {
            components,
            nchannel,
        })
    }

    /// Family name as written in PDF.
    pub fn family(&self) -> &str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRGB => "DeviceRGB",
            Self::DeviceCMYK => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRGB => "CalRGB",
            Self::Indexed { .. } => "Indexed",
            Self::Separation { .. } => "Separation",
            Self::ICCBased { .. } => "ICCBased",
            Self::DeviceN { nchannel: true, .. } => "NChannel",
            Self::DeviceN { .. } => "DeviceN",
            Self::Other(name) => name,
        }
    }

    /// Number of components per sample as stored in the image data.
    pub fn component_count(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray => 1,
            Self::DeviceRGB | Self::CalRGB => 3,
            Self::DeviceCMYK => 4,
            Self::Indexed { .. } | Self::Separation { .. } => 1,
            Self::ICCBased { components, .. } => *components,
            Self::DeviceN { components, .. } => *components,
            Self::Other(name) if name == "Lab" => 3,
            Self::Other(_) => 1,
        }
    }

    /// ICC profile bytes carried by this space, if any. An empty profile
    /// stream counts as no profile.
    pub fn icc_profile(&self) -> Option<&[u8]> {
        match self {
            Self::ICCBased { profile, .. } if !profile.is_empty() => Some(profile),
            _ => None,
        }
    }
}
