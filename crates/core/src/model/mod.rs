//! PDF model types - objects, color spaces, and functions.
//!
//! This module contains the PDF data the image pipeline consumes:
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef)
//! - `color` - Color space descriptors (ColorSpaceDescriptor)
//! - `function` - Tint-transform function evaluators

pub mod color;
pub mod function;
pub mod objects;

// Re-export main types for convenience
pub use color::ColorSpaceDescriptor;
pub use function::{ExponentialFunction, FnFunction, FunctionHandle, PdfFunction, SampledFunction};
pub use objects::{NoResolver, ObjectResolver, PDFObjRef, PDFObject, PDFStream};
