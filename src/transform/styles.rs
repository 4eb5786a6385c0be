//! Style adapter: SCSS → CSS with prefixing, minification and source maps.
//!
//! `grass` compiles each entry stylesheet (names starting with `_` are
//! partials), then `lightningcss` adds vendor prefixes for the configured
//! browsers and minifies. With `source_map = true` a `<name>.css.map` is
//! written next to the stylesheet and referenced from it. grass emits no
//! map of its own, so the map's source is the compiled `<name>.css`.

use std::path::Path;

use anyhow::anyhow;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::Targets;
use parcel_sourcemap::SourceMap;

use super::{Transform, TransformReport, ensure_dir, output_path, write_if_changed};
use crate::config::StylesConfig;
use crate::registry::SourceSet;
use crate::utils::path::slash_relative;

pub struct StyleTransform {
    targets: Targets,
    minify: bool,
    source_map: bool,
}

impl StyleTransform {
    pub fn new(config: &StylesConfig) -> anyhow::Result<Self> {
        let targets = config
            .targets()
            .map_err(|e| anyhow!("invalid browserslist query: {e}"))?;
        Ok(Self {
            targets,
            minify: config.minify,
            source_map: config.source_map,
        })
    }

    /// Prefix and minify compiled CSS, returning the code and its map.
    fn process(&self, css: &str, filename: &str) -> anyhow::Result<(String, Option<String>)> {
        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: filename.to_owned(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| anyhow!("failed to parse compiled CSS: {e}"))?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("failed to optimize CSS: {e}"))?;

        let mut source_map = if self.source_map {
            let mut map = SourceMap::new("/");
            map.add_source(filename);
            map.set_source_content(0, css)
                .map_err(|e| anyhow!("failed to build source map: {e:?}"))?;
            Some(map)
        } else {
            None
        };

        let result = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                targets: self.targets,
                source_map: source_map.as_mut(),
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("failed to print CSS: {e}"))?;

        let map_json = match source_map.as_mut() {
            Some(map) => Some(
                map.to_json(None)
                    .map_err(|e| anyhow!("failed to serialize source map: {e:?}"))?,
            ),
            None => None,
        };
        Ok((result.code, map_json))
    }

    fn compile_one(
        &self,
        sources: &SourceSet,
        source: &Path,
        dest: &Path,
        report: &mut TransformReport,
    ) -> anyhow::Result<()> {
        let options = grass::Options::default().style(grass::OutputStyle::Expanded);
        let compiled = grass::from_path(source, &options).map_err(|e| anyhow!("{e}"))?;

        let base = sources
            .pattern_for(source)
            .map(|p| p.base().to_path_buf())
            .unwrap_or_default();
        let filename = slash_relative(&source.with_extension("css"), &base);
        let (mut code, map) = self.process(&compiled, &filename)?;

        let out = output_path(sources, source, dest, Some("css"));
        if let Some(map) = map {
            let map_path = out.with_extension("css.map");
            let map_name = map_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            code.push_str(&format!("\n/*# sourceMappingURL={map_name} */\n"));
            report.record(write_if_changed(&map_path, map.as_bytes())?);
        }
        report.record(write_if_changed(&out, code.as_bytes())?);
        Ok(())
    }
}

impl Transform for StyleTransform {
    fn name(&self) -> &'static str {
        "styles"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        ensure_dir(dest)?;
        let mut report = TransformReport::default();

        for source in sources.matched_files() {
            if is_partial(&source) {
                continue;
            }
            if let Err(e) = self.compile_one(sources, &source, dest, &mut report) {
                report.fail(&source, e);
            }
        }
        Ok(report)
    }
}

/// `_name.scss` files are only imported by other stylesheets.
fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
