//! extractimg - Transcode decoded PDF image samples to PNG or TIFF
//!
//! Reads a file of already filter-decoded samples plus a JSON description of
//! the image (size, depth, color space, decode array, soft mask) and writes a
//! standalone raster file.
//!
//! Example description:
//!
//! ```json
//! {
//!   "width": 64, "height": 32, "bits_per_component": 4,
//!   "color_space": {
//!     "type": "Indexed", "hival": 1, "lookup": [0, 0, 0, 255, 0, 0],
//!     "base": { "type": "DeviceRGB" }
//!   },
//!   "soft_mask": { "samples": "mask.bin", "width": 64, "height": 32 }
//! }
//! ```

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pdfimage_core::image::{ExtractOptions, ImageInput, SoftMaskInput, extract_image};
use pdfimage_core::model::{ColorSpaceDescriptor, ExponentialFunction, FunctionHandle};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Transcode decoded PDF image samples to a PNG or TIFF file.
#[derive(Parser, Debug)]
#[command(name = "extractimg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File holding the packed, filter-decoded samples
    samples: PathBuf,

    /// JSON description of the image
    #[arg(short = 'm', long)]
    meta: PathBuf,

    /// Output path (default: the samples path with the format's extension)
    #[arg(short = 'o', long)]
    outfile: Option<PathBuf>,

    /// Merge the soft mask into an alpha channel
    #[arg(long = "merge-soft-mask", action = ArgAction::SetTrue)]
    merge_soft_mask: bool,

    /// Map Separation images through their tint transform
    #[arg(long = "apply-tint", action = ArgAction::SetTrue)]
    apply_tint: bool,

    /// Maximum decoded image size in bytes
    #[arg(long = "max-bytes")]
    max_bytes: Option<usize>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

#[derive(Debug, Deserialize)]
struct ImageMeta {
    width: u32,
    height: u32,
    #[serde(default = "default_bits")]
    bits_per_component: u32,
    color_space: ColorSpaceSpec,
    #[serde(default)]
    decode: Option<Vec<f64>>,
    #[serde(default)]
    soft_mask: Option<SoftMaskMeta>,
}

#[derive(Debug, Deserialize)]
struct SoftMaskMeta {
    samples: PathBuf,
    width: u32,
    height: u32,
    #[serde(default = "default_mask_bits")]
    bits_per_component: u32,
    #[serde(default)]
    decode: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ColorSpaceSpec {
    DeviceGray,
    #[serde(rename = "DeviceRGB")]
    DeviceRgb,
    #[serde(rename = "DeviceCMYK")]
    DeviceCmyk,
    CalGray,
    #[serde(rename = "CalRGB")]
    CalRgb,
    Indexed {
        base: Box<ColorSpaceSpec>,
        hival: u8,
        lookup: Vec<u8>,
    },
    Separation {
        name: String,
        alternate: Box<ColorSpaceSpec>,
        #[serde(default)]
        tint: Option<TintSpec>,
    },
    #[serde(rename = "ICCBased")]
    IccBased {
        components: usize,
        #[serde(default)]
        profile: Option<PathBuf>,
    },
    DeviceN {
        components: usize,
    },
}

/// A Type 2 (exponential) tint transform.
#[derive(Debug, Deserialize)]
struct TintSpec {
    c0: Vec<f64>,
    c1: Vec<f64>,
    #[serde(default = "default_exponent")]
    n: f64,
}

const fn default_bits() -> u32 {
    1
}

const fn default_mask_bits() -> u32 {
    8
}

const fn default_exponent() -> f64 {
    1.0
}

impl ColorSpaceSpec {
    fn into_descriptor(self, base_dir: &Path) -> Result<ColorSpaceDescriptor> {
        Ok(match self {
            Self::DeviceGray => ColorSpaceDescriptor::DeviceGray,
            Self::DeviceRgb => ColorSpaceDescriptor::DeviceRGB,
            Self::DeviceCmyk => ColorSpaceDescriptor::DeviceCMYK,
            Self::CalGray => ColorSpaceDescriptor::CalGray,
            Self::CalRgb => ColorSpaceDescriptor::CalRGB,
            Self::Indexed {
                base,
                hival,
                lookup,
            } => ColorSpaceDescriptor::Indexed {
                base: Box::new(base.into_descriptor(base_dir)?),
                hival,
                lookup,
            },
            Self::Separation {
                name,
                alternate,
                tint,
            } => ColorSpaceDescriptor::Separation {
                name,
                alternate: Box::new(alternate.into_descriptor(base_dir)?),
                tint: tint.map(|t| FunctionHandle::new(ExponentialFunction::new(t.c0, t.c1, t.n))),
            },
            Self::IccBased {
                components,
                profile,
            } => {
                let profile = match profile {
                    Some(path) => {
                        let path = base_dir.join(path);
                        fs::read(&path)
                            .with_context(|| format!("reading ICC profile {}", path.display()))?
                    }
                    None => Vec::new(),
                };
                ColorSpaceDescriptor::ICCBased {
                    components,
                    profile,
                }
            }
            Self::DeviceN { components } => ColorSpaceDescriptor::DeviceN {
                components,
                nchannel: false,
            },
        })
    }
}

fn load_input(args: &Args) -> Result<ImageInput> {
    let meta_text = fs::read_to_string(&args.meta)
        .with_context(|| format!("reading {}", args.meta.display()))?;
    let meta: ImageMeta = serde_json::from_str(&meta_text)
        .with_context(|| format!("parsing {}", args.meta.display()))?;
    let base_dir = args.meta.parent().unwrap_or_else(|| Path::new("."));

    let samples = fs::read(&args.samples)
        .with_context(|| format!("reading {}", args.samples.display()))?;
    let color_space = meta.color_space.into_descriptor(base_dir)?;
    let mut input = ImageInput::new(
        meta.width,
        meta.height,
        meta.bits_per_component,
        color_space,
        samples,
    );
    if let Some(decode) = meta.decode {
        input = input.with_decode(decode);
    }
    if let Some(mask) = meta.soft_mask {
        let path = base_dir.join(&mask.samples);
        let data =
            fs::read(&path).with_context(|| format!("reading soft mask {}", path.display()))?;
        let mut soft_mask =
            SoftMaskInput::new(mask.width, mask.height, mask.bits_per_component, data);
        soft_mask.decode = mask.decode;
        input = input.with_soft_mask(soft_mask);
    }
    Ok(input)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !args.samples.exists() {
        bail!("File not found: {}", args.samples.display());
    }

    let input = load_input(&args)?;
    let mut options = ExtractOptions {
        merge_soft_mask: args.merge_soft_mask,
        apply_tint_transform: args.apply_tint,
        ..Default::default()
    };
    if let Some(limit) = args.max_bytes {
        options.max_decoded_bytes = limit;
    }
    debug!(?options, "extracting");

    let image = extract_image(&input, &options)
        .with_context(|| format!("transcoding {}", args.samples.display()))?;
    let outfile = args
        .outfile
        .clone()
        .unwrap_or_else(|| args.samples.with_extension(image.extension()));
    fs::write(&outfile, &image.data)
        .with_context(|| format!("writing {}", outfile.display()))?;
    info!(
        width = image.metadata.width,
        height = image.metadata.height,
        channels = image.metadata.channels,
        mime = image.mime_type(),
        "wrote image"
    );

    println!("{}", outfile.display());
    Ok(())
}
