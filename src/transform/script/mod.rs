//! Script adapter: bundles every matched entry into one file.
//!
//! ```text
//! entries ──► graph (parse, resolve ./ ../) ──► link (registry IIFE)
//!                                                  │
//!                     dest/<output> ◄── compile (minify, lower to target)
//! ```
//!
//! Only relative imports are bundled. Nothing is written when no entry
//! matches.

mod compile;
mod graph;
mod helpers;
mod link;

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use oxc::transformer::TransformOptions;
use thiserror::Error;

use super::{Transform, TransformError, TransformReport, ensure_dir, write_if_changed};
use crate::config::ScriptsConfig;
use crate::debug;
use crate::registry::SourceSet;
use crate::utils::path::normalize_path;

use graph::ModuleGraph;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("cannot bundle `{specifier}` imported from `{from}`: only relative imports are supported")]
    BareSpecifier { specifier: String, from: PathBuf },

    #[error("cannot resolve `{specifier}` imported from `{from}`")]
    Unresolved { specifier: String, from: PathBuf },

    #[error("import cycle: {0}")]
    Cycle(String),

    #[error("{0}")]
    Transform(String),

    #[error(transparent)]
    Io(#[from] TransformError),
}

impl ScriptError {
    /// The module the error points at, when there is one.
    fn path(&self) -> Option<&Path> {
        match self {
            Self::Parse { path, .. } => Some(path.as_path()),
            Self::BareSpecifier { from, .. } | Self::Unresolved { from, .. } => Some(from.as_path()),
            _ => None,
        }
    }
}

pub struct ScriptTransform {
    target: String,
    output: String,
    minify: bool,
}

impl ScriptTransform {
    pub fn new(config: &ScriptsConfig) -> anyhow::Result<Self> {
        TransformOptions::from_target(&config.target)
            .map_err(|e| anyhow!("invalid scripts target `{}`: {e}", config.target))?;
        Ok(Self {
            target: config.target.clone(),
            output: config.output.clone(),
            minify: config.minify,
        })
    }

    fn bundle(&self, entries: &[PathBuf], base: &Path) -> Result<String, ScriptError> {
        let graph = ModuleGraph::build(entries, base)?;
        debug!("scripts"; "linking {} modules", graph.len());
        let linked = link::link(&graph);
        compile::compile(&linked, Path::new(&self.output), &self.target, self.minify)
    }
}

impl Transform for ScriptTransform {
    fn name(&self) -> &'static str {
        "scripts"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        let mut report = TransformReport::default();
        let entries = sources.matched_files();
        let Some(first) = entries.first() else {
            return Ok(report);
        };
        ensure_dir(dest)?;

        let base = sources
            .pattern_for(first)
            .map(|p| normalize_path(p.base()))
            .unwrap_or_default();
        let out = dest.join(&self.output);

        match self.bundle(&entries, &base) {
            Ok(code) => report.record(write_if_changed(&out, code.as_bytes())?),
            Err(e) => {
                let path = e.path().map_or_else(|| out.clone(), Path::to_path_buf);
                report.fail(&path, e);
            }
        }
        Ok(report)
    }
}
