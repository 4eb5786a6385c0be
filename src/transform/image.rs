//! Image adapter: lossless-ish recompression with a verbatim fallback.
//!
//! - PNG: re-encoded with best compression and adaptive filtering
//! - JPEG: re-encoded at `[images] jpeg_quality`
//! - SVG: minified through usvg, skipped when it contains `<text>`
//!
//! A recompressed file is kept only when smaller than its source. Other
//! formats, and anything that fails to decode, are copied as-is. Files are
//! processed in parallel.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use ::image::codecs::jpeg::JpegEncoder;
use ::image::codecs::png::{CompressionType, FilterType, PngEncoder};
use ::image::{DynamicImage, ImageFormat};
use anyhow::Context;
use rayon::prelude::*;

use super::{Transform, TransformError, TransformReport, Written, ensure_dir, output_path, write_if_changed};
use crate::config::ImagesConfig;
use crate::debug;
use crate::registry::SourceSet;

pub struct ImageTransform {
    optimize: bool,
    jpeg_quality: u8,
}

impl ImageTransform {
    pub fn new(config: &ImagesConfig) -> Self {
        Self {
            optimize: config.optimize,
            jpeg_quality: config.jpeg_quality,
        }
    }

    fn process(&self, source: &Path, out: &Path) -> anyhow::Result<Written> {
        let original = fs::read(source).map_err(|e| TransformError::Read(source.to_path_buf(), e))?;

        let optimized = if self.optimize {
            match self.recompress(source, &original) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("images"; "{}: {:#}, copying verbatim", source.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let bytes = match &optimized {
            Some(smaller) if smaller.len() < original.len() => smaller,
            _ => &original,
        };
        Ok(write_if_changed(out, bytes)?)
    }

    /// Recompressed bytes, or `None` for formats left untouched.
    fn recompress(&self, source: &Path, original: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "png" => {
                let img = decode(original, ImageFormat::Png)?;
                let mut buf = Vec::new();
                let encoder =
                    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
                img.write_with_encoder(encoder).context("failed to encode PNG")?;
                Ok(Some(buf))
            }
            "jpg" | "jpeg" => {
                let img = decode(original, ImageFormat::Jpeg)?;
                let mut buf = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                img.write_with_encoder(encoder).context("failed to encode JPEG")?;
                Ok(Some(buf))
            }
            "svg" => optimize_svg(original),
            _ => Ok(None),
        }
    }
}

fn decode(bytes: &[u8], format: ImageFormat) -> anyhow::Result<DynamicImage> {
    ::image::ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .context("failed to decode image")
}

/// Minified SVG markup. SVGs with text are left alone: usvg would need
/// system fonts to keep them intact.
fn optimize_svg(content: &[u8]) -> anyhow::Result<Option<Vec<u8>>> {
    if content.windows(5).any(|w| w == b"<text") {
        return Ok(None);
    }
    let tree = usvg::Tree::from_data(content, &usvg::Options::default()).context("failed to parse SVG")?;
    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        ..Default::default()
    };
    Ok(Some(tree.to_string(&write_options).into_bytes()))
}

impl Transform for ImageTransform {
    fn name(&self) -> &'static str {
        "images"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        ensure_dir(dest)?;
        let files = sources.matched_files();

        let results: Vec<_> = files
            .par_iter()
            .map(|source| {
                let out = output_path(sources, source, dest, None);
                (source, self.process(source, &out))
            })
            .collect();

        let mut report = TransformReport::default();
        for (source, result) in results {
            match result {
                Ok(written) => report.record(written),
                Err(e) => report.fail(source, e),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::transform::test_support::write;
    use ::image::{Rgba, RgbaImage};

    fn images(toml: &str) -> ImageTransform {
        ImageTransform::new(&test_parse_config(toml).images)
    }

    fn write_png(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = RgbaImage::from_pixel(64, 64, Rgba([200, 30, 30, 255]));
        let mut buf = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Fast, FilterType::NoFilter);
        DynamicImage::ImageRgba8(img).write_with_encoder(encoder).unwrap();
        fs::write(path, buf).unwrap();
    }

    #[test]
    fn test_png_never_grows() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let src = root.join("src/img/logo.png");
        write_png(&src);

        let sources = SourceSet::new(root, &["src/img/*"]).unwrap();
        let dest = root.join("dist/img");
        let report = images("").run(&sources, &dest).unwrap();
        assert!(report.is_ok(), "{:?}", report.errors);

        let out = fs::read(dest.join("logo.png")).unwrap();
        assert!(out.len() <= fs::metadata(&src).unwrap().len() as usize);
        let decoded = ::image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 64);
    }

    #[test]
    fn test_fallback_copies_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/img/broken.png", "not a png");
        write(root, "src/img/label.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>hi</text></svg>");
        write(root, "src/img/anim.gif", "GIF89a-ish");

        let sources = SourceSet::new(root, &["src/img/*"]).unwrap();
        let dest = root.join("dist/img");
        let report = images("").run(&sources, &dest).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.written, 3);
        assert_eq!(fs::read_to_string(dest.join("broken.png")).unwrap(), "not a png");
        assert!(fs::read_to_string(dest.join("label.svg")).unwrap().contains("<text>hi</text>"));
    }

    #[test]
    fn test_svg_minified_when_smaller() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let svg = "<?xml version=\"1.0\"?>\n<!-- drawn by hand -->\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\">\n\n    <rect x=\"0\" y=\"0\" width=\"10\" height=\"10\" fill=\"#ff0000\"/>\n\n</svg>\n";
        write(root, "src/img/box.svg", svg);

        let sources = SourceSet::new(root, &["src/img/*.svg"]).unwrap();
        let dest = root.join("out");
        images("").run(&sources, &dest).unwrap();
        let out = fs::read_to_string(dest.join("box.svg")).unwrap();
        assert!(out.len() < svg.len());
        assert!(out.contains("<svg"));
    }

    #[test]
    fn test_optimize_disabled_copies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let src = root.join("src/img/logo.png");
        write_png(&src);

        let sources = SourceSet::new(root, &["src/img/*"]).unwrap();
        let dest = root.join("out");
        images("[images]\noptimize = false").run(&sources, &dest).unwrap();
        assert_eq!(fs::read(dest.join("logo.png")).unwrap(), fs::read(&src).unwrap());
    }
}
