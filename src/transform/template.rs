//! Template-markup adapter: minijinja pages rendered to pretty HTML.
//!
//! Templates are loaded relative to the glob base of their pattern, so a
//! page in `src/templates/` can `{% extends "partials/layout.jinja" %}` or
//! `{% include "partials/nav.jinja" %}`. A fresh environment is built per
//! run; edited partials are always picked up.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use minijinja::{Environment, context, path_loader};
use rustc_hash::FxHashMap;

use super::{Transform, TransformReport, ensure_dir, output_path, prettify, write_if_changed};
use crate::registry::SourceSet;
use crate::utils::path::slash_relative;

/// Renders `.jinja` pages with minijinja.
pub struct TemplateTransform;

impl Transform for TemplateTransform {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        ensure_dir(dest)?;
        let mut report = TransformReport::default();
        let mut envs: FxHashMap<PathBuf, Environment<'static>> = FxHashMap::default();

        for source in sources.matched_files() {
            let Some(base) = sources.pattern_for(&source).map(|p| p.base().to_path_buf()) else {
                continue;
            };
            let env = envs.entry(base.clone()).or_insert_with(|| environment(&base));
            let name = slash_relative(&source, &base);

            let result = render(env, &name).and_then(|html| {
                let out = output_path(sources, &source, dest, Some("html"));
                Ok(write_if_changed(&out, prettify(&html).as_bytes())?)
            });
            match result {
                Ok(written) => report.record(written),
                Err(e) => report.fail(&source, e),
            }
        }
        Ok(report)
    }
}

fn environment(base: &Path) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(base));
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env
}

fn render(env: &Environment<'static>, name: &str) -> anyhow::Result<String> {
    let template = env
        .get_template(name)
        .map_err(|e| anyhow!("{e:#}"))?;
    template.render(context! {}).map_err(|e| anyhow!("{e:#}"))
}
