//! PDF object types at the boundary with the document parser.
//!
//! The object graph, tokenizer and stream filters live outside this crate.
//! Callers hand over already-parsed objects and, for image streams, the
//! filter-decoded sample bytes.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /DeviceRGB)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(HashMap<String, Self>),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Shorthand for building a name object.
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get an array of numbers, e.g. a /Decode or /Domain entry.
    pub fn as_num_array(&self) -> Result<Vec<f64>> {
        self.as_array()?.iter().map(Self::as_num).collect()
    }

    /// Get type name for error messages
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// Looks up indirect objects in the surrounding document.
pub trait ObjectResolver {
    /// Return the object a reference points to, if the document has it.
    fn resolve_ref(&self, objref: &PDFObjRef) -> Option<PDFObject>;

    /// Follow references until a direct object is reached.
    ///
    /// Chains are capped at 32 hops so a cyclic document cannot loop forever.
    fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        let mut current = obj.clone();
        for _ in 0..32 {
            match current {
                PDFObject::Ref(r) => {
                    current = self.resolve_ref(&r).ok_or_else(|| {
                        PdfError::KeyError(format!("object {} {} R", r.objid, r.genno))
                    })?;
                }
                direct => return Ok(direct),
            }
        }
        Err(PdfError::DecodeError("reference chain too deep".to_string()))
    }
}

/// Resolver for self-contained objects; every reference is missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ObjectResolver for NoResolver {
    fn resolve_ref(&self, _objref: &PDFObjRef) -> Option<PDFObject> {
        None
    }
}

impl ObjectResolver for HashMap<u32, PDFObject> {
    fn resolve_ref(&self, objref: &PDFObjRef) -> Option<PDFObject> {
        self.get(&objref.objid).cloned()
    }
}

/// PDF Stream - dictionary attributes + binary data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: HashMap<String, PDFObject>,
    /// Raw (possibly encoded) data
    rawdata: Bytes,
    /// Filter-decoded data, supplied by the document layer
    data: Option<Vec<u8>>,
    /// Object ID (set when stream is part of document)
    pub objid: Option<u32>,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: HashMap<String, PDFObject>, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            data: None,
            objid: None,
        }
    }

    /// Create a stream whose filters have already been reversed.
    pub fn with_decoded(attrs: HashMap<String, PDFObject>, data: Vec<u8>) -> Self {
        let mut stream = Self::new(attrs, Bytes::new());
        stream.data = Some(data);
        stream
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Get decoded data, falling back to the raw bytes for unfiltered streams.
    pub fn get_data(&self) -> &[u8] {
        self.data
            .as_deref()
            .unwrap_or_else(|| self.rawdata.as_ref())
    }

    /// Check if stream contains a key.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// Get attribute, trying multiple names.
    ///
    /// Inline images use abbreviated keys (`/W` for `/Width` and so on).
    pub fn get_any(&self, names: &[&str]) -> Option<&PDFObject> {
        for name in names {
            if let Some(obj) = self.attrs.get(*name) {
                return Some(obj);
            }
        }
        None
    }

    /// Names of the stream's filters, in application order.
    pub fn filter_names(&self) -> Vec<String> {
        match self.get_any(&["Filter", "F"]) {
            Some(PDFObject::Name(name)) => vec![name.clone()],
            Some(PDFObject::Array(arr)) => arr
                .iter()
                .filter_map(|obj| obj.as_name().ok().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_follows_refs() {
        let mut objects = HashMap::new();
        objects.insert(1, PDFObject::Ref(PDFObjRef::new(2, 0)));
        objects.insert(2, PDFObject::Int(7));
        let resolved = objects
            .resolve(&PDFObject::Ref(PDFObjRef::new(1, 0)))
            .unwrap();
        assert_eq!(resolved, PDFObject::Int(7));
    }

    #[test]
    fn test_resolve_missing_ref() {
        let result = NoResolver.resolve(&PDFObject::Ref(PDFObjRef::new(9, 0)));
        assert!(matches!(result, Err(PdfError::KeyError(_))));
    }

    #[test]
    fn test_resolve_cycle_terminates() {
        let mut objects = HashMap::new();
        objects.insert(1, PDFObject::Ref(PDFObjRef::new(1, 0)));
        assert!(objects.resolve(&PDFObject::Ref(PDFObjRef::new(1, 0))).is_err());
    }

    #[test]
    fn test_filter_names() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "Filter".to_string(),
            PDFObject::Array(vec![
                PDFObject::name("FlateDecode"),
                PDFObject::name("DCTDecode"),
            ]),
        );
        let stream = PDFStream::new(attrs, b"".to_vec());
        assert_eq!(stream.filter_names(), vec!["FlateDecode", "DCTDecode"]);
    }

    #[test]
    fn test_decoded_data_preferred() {
        let raw = PDFStream::new(HashMap::new(), b"raw".to_vec());
        assert_eq!(raw.get_data(), b"raw");
        assert_eq!(raw.get_rawdata(), b"raw");
        let decoded = PDFStream::with_decoded(HashMap::new(), b"decoded".to_vec());
        assert_eq!(decoded.get_data(), b"decoded");
        assert!(decoded.get_rawdata().is_empty());
    }
}
