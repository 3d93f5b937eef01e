//! Image export to a directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::image::extract::{ExtractOptions, extract_image};
use crate::image::xobject::ImageInput;
use crate::model::objects::{ObjectResolver, PDFStream};

/// Image writer for exporting PDF images to files.
///
/// Files are named `<name>_<seq>.<ext>`, with every non-alphanumeric
/// character of `name` replaced by `_`.
pub struct ImageWriter {
    outdir: PathBuf,
    seq: usize,
    options: ExtractOptions,
}

impl ImageWriter {
    pub fn new(outdir: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(outdir, ExtractOptions::default())
    }

    pub fn with_options(outdir: impl AsRef<Path>, options: ExtractOptions) -> Result<Self> {
        let outdir = outdir.as_ref().to_path_buf();
        fs::create_dir_all(&outdir)?;
        Ok(Self {
            outdir,
            seq: 0,
            options,
        })
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    fn next_path(&mut self, name: &str, ext: &str) -> PathBuf {
        let base = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect::<String>();
        let base = if base.is_empty() {
            "image".to_string()
        } else {
            base
        };
        self.seq += 1;
        let filename = format!("{}_{}.{}", base, self.seq, ext);
        self.outdir.join(filename)
    }

    /// Write data to a file and return the filename.
    fn write_and_return_filename(&mut self, name: &str, ext: &str, data: &[u8]) -> Result<String> {
        let path = self.next_path(name, ext);
        fs::write(&path, data)?;
        debug!(path = %path.display(), bytes = data.len(), "wrote image");
        Ok(path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string())
    }

    /// Export an image XObject stream to disk.
    ///
    /// JPEG, JPEG 2000 and JBIG2 streams are already standalone files and are
    /// written as-is. Everything else goes through the pipeline; its errors
    /// are returned, not papered over.
    pub fn export_image(
        &mut self,
        name: &str,
        stream: &PDFStream,
        resolver: &dyn ObjectResolver,
    ) -> Result<String> {
        let filters = stream.filter_names();
        if let Some(ext) = filters.last().and_then(|f| passthrough_extension(f)) {
            return self.write_and_return_filename(name, ext, stream.get_data());
        }
        let input = ImageInput::from_stream(stream, resolver)?;
        self.write_image(name, &input)
    }

    /// Run the pipeline on `input` and write the result.
    pub fn write_image(&mut self, name: &str, input: &ImageInput) -> Result<String> {
        let image = extract_image(input, &self.options)?;
        self.write_and_return_filename(name, image.extension(), &image.data)
    }
}

fn passthrough_extension(filter: &str) -> Option<&'static str> {
    if filter.eq_ignore_ascii_case("DCTDecode") || filter.eq_ignore_ascii_case("DCT") {
        Some("jpg")
    } else if filter.eq_ignore_ascii_case("JPXDecode") || filter.eq_ignore_ascii_case("JPX") {
        Some("jp2")
    } else if filter.eq_ignore_ascii_case("JBIG2Decode") {
        Some("jb2")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::passthrough_extension;

    #[test]
    fn passthrough_filters() {
        assert_eq!(passthrough_extension("DCTDecode"), Some("jpg"));
        assert_eq!(passthrough_extension("JPX"), Some("jp2"));
        assert_eq!(passthrough_extension("JBIG2Decode"), Some("jb2"));
        assert_eq!(passthrough_extension("FlateDecode"), None);
    }
}
