//! PDF functions used as Separation tint transforms.
//!
//! Only the evaluator interface matters to the image pipeline: a tint value in
//! `[0, 1]` goes in, the alternate space's components come out. Type 2
//! (exponential) and single-input Type 0 (sampled) functions are evaluated
//! here; anything else can be plugged in through [`PdfFunction`].

use std::fmt;
use std::sync::Arc;

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjectResolver, PDFObject, PDFStream};
use crate::utils::{clamp_between, interpolate, max_sample, read_bits};
use std::collections::HashMap;

/// A PDF function evaluator.
pub trait PdfFunction: Send + Sync {
    /// Number of values produced per evaluation.
    fn output_count(&self) -> usize;

    /// Evaluate the function. Inputs outside the domain are clipped.
    fn evaluate(&self, inputs: &[f64]) -> Vec<f64>;
}

/// Shared handle to a function, cheap to clone into descriptors and plans.
#[derive(Clone)]
pub struct FunctionHandle(Arc<dyn PdfFunction>);

impl FunctionHandle {
    pub fn new(function: impl PdfFunction + 'static) -> Self {
        Self(Arc::new(function))
    }

    pub fn output_count(&self) -> usize {
        self.0.output_count()
    }

    pub fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        self.0.evaluate(inputs)
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandle(outputs={})", self.output_count())
    }
}

/// Adapts a closure into a [`PdfFunction`].
pub struct FnFunction<F> {
    outputs: usize,
    f: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    pub const fn new(outputs: usize, f: F) -> Self {
        Self { outputs, f }
    }
}

impl<F> PdfFunction for FnFunction<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn output_count(&self) -> usize {
        self.outputs
    }

    fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        (self.f)(inputs)
    }
}

/// Type 2 function: `y = C0 + x^N * (C1 - C0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFunction {
    pub domain: [f64; 2],
    pub range: Option<Vec<f64>>,
    pub c0: Vec<f64>,
    pub c1: Vec<f64>,
    pub n: f64,
}

impl ExponentialFunction {
    pub fn new(c0: Vec<f64>, c1: Vec<f64>, n: f64) -> Self {
        Self {
            domain: [0.0, 1.0],
            range: None,
            c0,
            c1,
            n,
        }
    }

    fn from_dict(dict: &HashMap<String, PDFObject>) -> Result<Self> {
        let domain = domain_of(dict)?;
        let c0 = match dict.get("C0") {
            Some(obj) => obj.as_num_array()?,
            None => vec![0.0],
        };
        let c1 = match dict.get("C1") {
            Some(obj) => obj.as_num_array()?,
            None => vec![1.0],
        };
        if c0.len() != c1.len() {
            return Err(PdfError::UnsupportedFunction(
                "C0 and C1 differ in length".to_string(),
            ));
        }
        let n = dict
            .get("N")
            .ok_or_else(|| PdfError::KeyError("N".to_string()))?
            .as_num()?;
        let range = dict.get("Range").map(PDFObject::as_num_array).transpose()?;
        Ok(Self {
            domain,
            range,
            c0,
            c1,
            n,
        })
    }
}

impl PdfFunction for ExponentialFunction {
    fn output_count(&self) -> usize {
        self.c0.len()
    }

    fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        let x = clamp_between(
            inputs.first().copied().unwrap_or(0.0),
            self.domain[0],
            self.domain[1],
        );
        let xn = x.powf(self.n);
        self.c0
            .iter()
            .zip(&self.c1)
            .enumerate()
            .map(|(j, (c0, c1))| clip_to_range(self.range.as_deref(), j, c0 + xn * (c1 - c0)))
            .collect()
    }
}

/// Type 0 function restricted to a single input, as used for tint transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    pub domain: [f64; 2],
    pub range: Vec<f64>,
    pub size: usize,
    pub bits_per_sample: u32,
    pub encode: [f64; 2],
    pub decode: Vec<f64>,
    pub samples: Vec<u8>,
}

impl SampledFunction {
    fn from_stream(stream: &PDFStream) -> Result<Self> {
        let dict = &stream.attrs;
        let domain = domain_of(dict)?;
        let range = dict
            .get("Range")
            .ok_or_else(|| PdfError::KeyError("Range".to_string()))?
            .as_num_array()?;
        if range.len() < 2 || range.len() % 2 != 0 {
            return Err(PdfError::UnsupportedFunction(format!(
                "Range has {} entries",
                range.len()
            )));
        }
        let size = dict
            .get("Size")
            .ok_or_else(|| PdfError::KeyError("Size".to_string()))?
            .as_num_array()?;
        if size.len() != 1 {
            return Err(PdfError::UnsupportedFunction(format!(
                "sampled function with {} inputs",
                size.len()
            )));
        }
        let size = size[0] as usize;
        if size == 0 {
            return Err(PdfError::UnsupportedFunction("empty sample table".to_string()));
        }
        let bits_per_sample = dict
            .get("BitsPerSample")
            .ok_or_else(|| PdfError::KeyError("BitsPerSample".to_string()))?
            .as_int()? as u32;
        if !matches!(bits_per_sample, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32) {
            return Err(PdfError::UnsupportedFunction(format!(
                "BitsPerSample {bits_per_sample}"
            )));
        }
        let encode = match dict.get("Encode") {
            Some(obj) => {
                let e = obj.as_num_array()?;
                if e.len() < 2 {
                    return Err(PdfError::UnsupportedFunction("short Encode".to_string()));
                }
                [e[0], e[1]]
            }
            None => [0.0, (size - 1) as f64],
        };
        let decode = match dict.get("Decode") {
            Some(obj) => obj.as_num_array()?,
            None => range.clone(),
        };
        if decode.len() != range.len() {
            return Err(PdfError::UnsupportedFunction(
                "Decode and Range differ in length".to_string(),
            ));
        }
        Ok(Self {
            domain,
            range,
            size,
            bits_per_sample,
            encode,
            decode,
            samples: stream.get_data().to_vec(),
        })
    }

    fn sample(&self, index: usize, output: usize) -> f64 {
        let bit = (index * self.output_count() + output) * self.bits_per_sample as usize;
        read_bits(&self.samples, bit, self.bits_per_sample) as f64
    }
}

impl PdfFunction for SampledFunction {
    fn output_count(&self) -> usize {
        self.range.len() / 2
    }

    fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        let x = clamp_between(
            inputs.first().copied().unwrap_or(0.0),
            self.domain[0],
            self.domain[1],
        );
        let last = (self.size - 1) as f64;
        let e = interpolate(x, self.domain[0], self.domain[1], self.encode[0], self.encode[1])
            .clamp(0.0, last);
        let i0 = e.floor() as usize;
        let i1 = (i0 + 1).min(self.size - 1);
        let frac = e - i0 as f64;
        let smax = max_sample(self.bits_per_sample) as f64;

        (0..self.output_count())
            .map(|j| {
                let s0 = self.sample(i0, j);
                let s1 = self.sample(i1, j);
                let s = s0 + frac * (s1 - s0);
                let y = interpolate(s, 0.0, smax, self.decode[2 * j], self.decode[2 * j + 1]);
                clip_to_range(Some(&self.range), j, y)
            })
            .collect()
    }
}

/// An array of single-output functions evaluated side by side.
struct FunctionArray(Vec<FunctionHandle>);

impl PdfFunction for FunctionArray {
    fn output_count(&self) -> usize {
        self.0.iter().map(FunctionHandle::output_count).sum()
    }

    fn evaluate(&self, inputs: &[f64]) -> Vec<f64> {
        self.0.iter().flat_map(|f| f.evaluate(inputs)).collect()
    }
}

/// Build an evaluator from a function dictionary, stream, or array of them.
pub fn function_from_object(
    obj: &PDFObject,
    resolver: &dyn ObjectResolver,
) -> Result<FunctionHandle> {
    let obj = resolver.resolve(obj)?;
    match &obj {
        PDFObject::Array(items) => {
            let parts = items
                .iter()
                .map(|item| function_from_object(item, resolver))
                .collect::<Result<Vec<_>>>()?;
            Ok(FunctionHandle::new(FunctionArray(parts)))
        }
        PDFObject::Dict(dict) => match function_type(dict)? {
            2 => Ok(FunctionHandle::new(ExponentialFunction::from_dict(dict)?)),
            0 => Err(PdfError::UnsupportedFunction(
                "Type 0 function must be a stream".to_string(),
            )),
            other => Err(PdfError::UnsupportedFunction(format!("FunctionType {other}"))),
        },
        PDFObject::Stream(stream) => match function_type(&stream.attrs)? {
            0 => Ok(FunctionHandle::new(SampledFunction::from_stream(stream)?)),
            2 => Ok(FunctionHandle::new(ExponentialFunction::from_dict(&stream.attrs)?)),
            other => Err(PdfError::UnsupportedFunction(format!("FunctionType {other}"))),
        },
        _ => Err(PdfError::TypeError {
            expected: "function",
            got: "non-function object",
        }),
    }
}

fn function_type(dict: &HashMap<String, PDFObject>) -> Result<i64> {
    dict.get("FunctionType")
        .ok_or_else(|| PdfError::KeyError("FunctionType".to_string()))?
        .as_int()
}

fn domain_of(dict: &HashMap<String, PDFObject>) -> Result<[f64; 2]> {
    match dict.get("Domain") {
        Some(obj) => {
            let d = obj.as_num_array()?;
            if d.len() < 2 {
                return Err(PdfError::UnsupportedFunction("short Domain".to_string()));
            }
            Ok([d[0], d[1]])
        }
        None => Ok([0.0, 1.0]),
    }
}

fn clip_to_range(range: Option<&[f64]>, j: usize, y: f64) -> f64 {
    match range {
        Some(r) if r.len() >= 2 * j + 2 => clamp_between(y, r[2 * j], r[2 * j + 1]),
        _ => y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::objects::NoResolver;

    fn nums(values: &[f64]) -> PDFObject {
        PDFObject::Array(values.iter().map(|v| PDFObject::Real(*v)).collect())
    }

    #[test]
    fn test_exponential_linear() {
        let f = ExponentialFunction::new(vec![1.0, 1.0, 1.0], vec![1.0, 0.0, 0.0], 1.0);
        assert_eq!(f.evaluate(&[0.0]), vec![1.0, 1.0, 1.0]);
        assert_eq!(f.evaluate(&[1.0]), vec![1.0, 0.0, 0.0]);
        assert_eq!(f.evaluate(&[0.5]), vec![1.0, 0.5, 0.5]);
    }

    #[test]
    fn test_exponential_clips_domain() {
        let f = ExponentialFunction::new(vec![0.0], vec![1.0], 2.0);
        assert_eq!(f.evaluate(&[2.0]), vec![1.0]);
        assert_eq!(f.evaluate(&[0.5]), vec![0.25]);
    }

    #[test]
    fn test_exponential_from_dict() {
        let mut dict = HashMap::new();
        dict.insert("FunctionType".to_string(), PDFObject::Int(2));
        dict.insert("Domain".to_string(), nums(&[0.0, 1.0]));
        dict.insert("C1".to_string(), nums(&[0.0, 0.5, 1.0]));
        dict.insert("N".to_string(), PDFObject::Int(1));
        let f = function_from_object(&PDFObject::Dict(dict), &NoResolver).unwrap();
        assert_eq!(f.output_count(), 3);
        assert_eq!(f.evaluate(&[1.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_sampled_interpolates() {
        let mut attrs = HashMap::new();
        attrs.insert("FunctionType".to_string(), PDFObject::Int(0));
        attrs.insert("Domain".to_string(), nums(&[0.0, 1.0]));
        attrs.insert("Range".to_string(), nums(&[0.0, 1.0, 0.0, 1.0]));
        attrs.insert("Size".to_string(), PDFObject::Array(vec![PDFObject::Int(2)]));
        attrs.insert("BitsPerSample".to_string(), PDFObject::Int(8));
        let stream = PDFStream::with_decoded(attrs, vec![255, 0, 0, 255]);
        let f = function_from_object(&PDFObject::Stream(Box::new(stream)), &NoResolver).unwrap();
        assert_eq!(f.evaluate(&[0.0]), vec![1.0, 0.0]);
        assert_eq!(f.evaluate(&[1.0]), vec![0.0, 1.0]);
        assert_eq!(f.evaluate(&[0.5]), vec![0.5, 0.5]);
    }

    #[test]
    fn test_function_array_concatenates() {
        let parts = [0.2, 0.4].map(|c| {
            let mut dict = HashMap::new();
            dict.insert("FunctionType".to_string(), PDFObject::Int(2));
            dict.insert("C1".to_string(), nums(&[c]));
            dict.insert("N".to_string(), PDFObject::Int(1));
            PDFObject::Dict(dict)
        });
        let f = function_from_object(&PDFObject::Array(parts.to_vec()), &NoResolver).unwrap();
        assert_eq!(f.output_count(), 2);
        assert_eq!(f.evaluate(&[1.0]), vec![0.2, 0.4]);
    }

    #[test]
    fn test_postscript_function_unsupported() {
        let mut attrs = HashMap::new();
        attrs.insert("FunctionType".to_string(), PDFObject::Int(4));
        let stream = PDFStream::with_decoded(attrs, b"{ pop 1 }".to_vec());
        let result = function_from_object(&PDFObject::Stream(Box::new(stream)), &NoResolver);
        assert!(matches!(result, Err(PdfError::UnsupportedFunction(_))));
    }

    #[test]
    fn test_closure_function() {
        let f = FunctionHandle::new(FnFunction::new(3, |x: &[f64]| vec![x[0]; 3]));
        assert_eq!(f.evaluate(&[0.25]), vec![0.25, 0.25, 0.25]);
    }
}
