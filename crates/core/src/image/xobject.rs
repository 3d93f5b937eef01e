//! Image XObject inputs.
//!
//! Reads the entries of an image stream's dictionary that the pipeline needs.
//! Filter decoding has already happened; the stream's decoded data is taken
//! as the packed sample bytes.

use crate::error::{PdfError, Result};
use crate::model::color::ColorSpaceDescriptor;
use crate::model::objects::{ObjectResolver, PDFObject, PDFStream};

/// A soft mask: one channel of alpha samples at its own depth.
#[derive(Debug, Clone)]
pub struct SoftMaskInput {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub decode: Option<Vec<f64>>,
    pub data: Vec<u8>,
}

impl SoftMaskInput {
    pub fn new(width: u32, height: u32, bits_per_component: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bits_per_component,
            decode: None,
            data,
        }
    }

    /// Read an `/SMask` stream.
    pub fn from_stream(stream: &PDFStream, resolver: &dyn ObjectResolver) -> Result<Self> {
        let dims = ImageDims::read(stream, resolver)?;
        Ok(Self {
            width: dims.width,
            height: dims.height,
            bits_per_component: dims.bits.unwrap_or(8),
            decode: dims.decode,
            data: stream.get_data().to_vec(),
        })
    }
}

/// Everything the pipeline needs to know about one image.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u32,
    pub color_space: ColorSpaceDescriptor,
    pub decode: Option<Vec<f64>>,
    /// Packed, filter-decoded samples.
    pub data: Vec<u8>,
    pub soft_mask: Option<SoftMaskInput>,
}

impl ImageInput {
    pub fn new(
        width: u32,
        height: u32,
        bits_per_component: u32,
        color_space: ColorSpaceDescriptor,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            bits_per_component,
            color_space,
            decode: None,
            data,
            soft_mask: None,
        }
    }

    pub fn with_decode(mut self, decode: Vec<f64>) -> Self {
        self.decode = Some(decode);
        self
    }

    pub fn with_soft_mask(mut self, mask: SoftMaskInput) -> Self {
        self.soft_mask = Some(mask);
        self
    }

    /// Read an image XObject (or inline image) stream.
    ///
    /// Stencil masks (`/ImageMask true`) become 1-bit DeviceGray images.
    /// `/BitsPerComponent` defaults to 1.
    pub fn from_stream(stream: &PDFStream, resolver: &dyn ObjectResolver) -> Result<Self> {
        let dims = ImageDims::read(stream, resolver)?;
        let is_mask = match stream.get_any(&["ImageMask", "IM"]) {
            Some(obj) => resolver.resolve(obj)?.as_bool()?,
            None => false,
        };

        let (bits, color_space) = if is_mask {
            (1, ColorSpaceDescriptor::DeviceGray)
        } else {
            let cs = stream
                .get_any(&["ColorSpace", "CS"])
                .ok_or_else(|| PdfError::KeyError("ColorSpace".to_string()))?;
            let cs = ColorSpaceDescriptor::from_object(&resolver.resolve(cs)?, resolver)?;
            (dims.bits.unwrap_or(1), cs)
        };

        let soft_mask = match stream.get("SMask") {
            Some(obj) => match resolver.resolve(obj)? {
                PDFObject::Stream(mask) => Some(SoftMaskInput::from_stream(&mask, resolver)?),
                _ => None,
            },
            None => None,
        };

        Ok(Self {
            width: dims.width,
            height: dims.height,
            bits_per_component: bits,
            color_space,
            decode: dims.decode,
            data: stream.get_data().to_vec(),
            soft_mask,
        })
    }
}

/// Dictionary entries shared by images and soft masks.
struct ImageDims {
    width: u32,
    height: u32,
    bits: Option<u32>,
    decode: Option<Vec<f64>>,
}

impl ImageDims {
    fn read(stream: &PDFStream, resolver: &dyn ObjectResolver) -> Result<Self> {
        let width = read_dimension(stream, resolver, &["Width", "W"])?;
        let height = read_dimension(stream, resolver, &["Height", "H"])?;
        let bits = match stream.get_any(&["BitsPerComponent", "BPC"]) {
            Some(obj) => {
                let bits = resolver.resolve(obj)?.as_int()?;
                Some(u32::try_from(bits).map_err(|_| {
                    PdfError::InvalidImage(format!("bits per component {bits}"))
                })?)
            }
            None => None,
        };
        let decode = match stream.get_any(&["Decode", "D"]) {
            Some(obj) => Some(resolver.resolve(obj)?.as_num_array()?),
            None => None,
        };
        Ok(Self {
            width,
            height,
            bits,
            decode,
        })
    }
}

fn read_dimension(stream: &PDFStream, resolver: &dyn ObjectResolver, keys: &[&str]) -> Result<u32> {
    let obj = stream
        .get_any(keys)
        .ok_or_else(|| PdfError::KeyError(keys[0].to_string()))?;
    let value = resolver.resolve(obj)?.as_int()?;
    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(PdfError::InvalidImage(format!("{} {value}", keys[0]))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::{NoResolver, PDFObjRef};
    use std::collections::HashMap;

    fn attrs(entries: &[(&str, PDFObject)]) -> HashMap<String, PDFObject> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_reads_full_dictionary() {
        let stream = PDFStream::with_decoded(
            attrs(&[
                ("Width", PDFObject::Int(2)),
                ("Height", PDFObject::Int(1)),
                ("BitsPerComponent", PDFObject::Int(8)),
                ("ColorSpace", PDFObject::name("DeviceRGB")),
                ("Decode", PDFObject::Array(vec![PDFObject::Int(1), PDFObject::Int(0)])),
            ]),
            vec![0; 6],
        );
        let input = ImageInput::from_stream(&stream, &NoResolver).unwrap();
        assert_eq!((input.width, input.height, input.bits_per_component), (2, 1, 8));
        assert!(matches!(input.color_space, ColorSpaceDescriptor::DeviceRGB));
        assert_eq!(input.decode, Some(vec![1.0, 0.0]));
        assert!(input.soft_mask.is_none());
    }

    #[test]
    fn test_inline_abbreviations_and_default_depth() {
        let stream = PDFStream::with_decoded(
            attrs(&[
                ("W", PDFObject::Int(8)),
                ("H", PDFObject::Int(1)),
                ("CS", PDFObject::name("G")),
            ]),
            vec![0xAA],
        );
        let input = ImageInput::from_stream(&stream, &NoResolver).unwrap();
        assert_eq!(input.bits_per_component, 1);
        assert!(matches!(input.color_space, ColorSpaceDescriptor::DeviceGray));
    }

    #[test]
    fn test_stencil_mask_is_gray() {
        let stream = PDFStream::with_decoded(
            attrs(&[
                ("Width", PDFObject::Int(8)),
                ("Height", PDFObject::Int(1)),
                ("ImageMask", PDFObject::Bool(true)),
            ]),
            vec![0x0F],
        );
        let input = ImageInput::from_stream(&stream, &NoResolver).unwrap();
        assert_eq!(input.bits_per_component, 1);
        assert!(matches!(input.color_space, ColorSpaceDescriptor::DeviceGray));
    }

    #[test]
    fn test_soft_mask_through_reference() {
        let mask = PDFStream::with_decoded(
            attrs(&[
                ("Width", PDFObject::Int(2)),
                ("Height", PDFObject::Int(1)),
                ("BitsPerComponent", PDFObject::Int(8)),
                ("ColorSpace", PDFObject::name("DeviceGray")),
            ]),
            vec![10, 20],
        );
        let mut objects: HashMap<u32, PDFObject> = HashMap::new();
        objects.insert(7, PDFObject::Stream(Box::new(mask)));
        let stream = PDFStream::with_decoded(
            attrs(&[
                ("Width", PDFObject::Int(2)),
                ("Height", PDFObject::Int(1)),
                ("BitsPerComponent", PDFObject::Int(8)),
                ("ColorSpace", PDFObject::name("DeviceGray")),
                ("SMask", PDFObject::Ref(PDFObjRef::new(7, 0))),
            ]),
            vec![1, 2],
        );
        let input = ImageInput::from_stream(&stream, &objects).unwrap();
        let mask = input.soft_mask.unwrap();
        assert_eq!(mask.data, vec![10, 20]);
        assert_eq!(mask.bits_per_component, 8);
    }

    #[test]
    fn test_missing_dimension() {
        let stream = PDFStream::with_decoded(attrs(&[("Height", PDFObject::Int(1))]), vec![]);
        let err = ImageInput::from_stream(&stream, &NoResolver).unwrap_err();
        assert!(matches!(err, PdfError::KeyError(ref key) if key == "Width"));
    }

    #[test]
    fn test_zero_width_rejected() {
        let stream = PDFStream::with_decoded(
            attrs(&[
                ("Width", PDFObject::Int(0)),
                ("Height", PDFObject::Int(1)),
                ("ColorSpace", PDFObject::name("DeviceGray")),
            ]),
            vec![],
        );
        assert!(matches!(
            ImageInput::from_stream(&stream, &NoResolver),
            Err(PdfError::InvalidImage(_))
        ));
    }
}
