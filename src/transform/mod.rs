//! Transform adapters: one per asset category.
//!
//! Each adapter reads the files its [`SourceSet`] matches at call time and
//! writes outputs under a destination directory. Outputs are only written
//! when their bytes change, so repeated runs leave the tree untouched.
//!
//! | Module     | Category        | Library                    |
//! |------------|-----------------|----------------------------|
//! | `template` | TemplateMarkup  | minijinja                  |
//! | `include`  | PlainMarkup     | regex (`@@include`)        |
//! | `styles`   | Styles          | grass + lightningcss       |
//! | `copy`     | Fonts           | std::fs                    |
//! | `image`    | Images          | image + usvg + rayon       |
//! | `script`   | Scripts         | oxc                        |
//! | `pretty`   | (shared)        | HTML re-indentation        |

mod copy;
mod image;
mod include;
mod pretty;
mod script;
mod styles;
mod template;

pub use copy::CopyTransform;
pub use image::ImageTransform;
pub use include::IncludeTransform;
pub use pretty::prettify;
pub use script::ScriptTransform;
pub use styles::StyleTransform;
pub use template::TemplateTransform;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::KilnConfig;
use crate::core::AssetCategory;
use crate::registry::SourceSet;

/// Read matched source files, produce output files under `dest`.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Process every file `sources` matches now.
    ///
    /// Per-file failures go into the report; `Err` means the adapter could
    /// not run at all (e.g. `dest` cannot be created).
    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport>;
}

/// Build the adapter for `category` from the loaded configuration.
pub fn adapter_for(category: AssetCategory, config: &KilnConfig) -> anyhow::Result<Arc<dyn Transform>> {
    Ok(match category {
        AssetCategory::TemplateMarkup => Arc::new(TemplateTransform),
        AssetCategory::PlainMarkup => Arc::new(IncludeTransform),
        AssetCategory::Styles => Arc::new(StyleTransform::new(&config.styles)?),
        AssetCategory::Fonts => Arc::new(CopyTransform),
        AssetCategory::Images => Arc::new(ImageTransform::new(&config.images)),
        AssetCategory::Scripts => Arc::new(ScriptTransform::new(&config.scripts)?),
    })
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to read `{0}`")]
    Read(PathBuf, #[source] io::Error),

    #[error("failed to write `{0}`")]
    Write(PathBuf, #[source] io::Error),

    #[error("failed to create directory `{0}`")]
    CreateDir(PathBuf, #[source] io::Error),
}

// ============================================================================
// Report
// ============================================================================

/// One file that failed to transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileError {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome counts of one adapter run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// Outputs whose bytes changed
    pub written: usize,
    /// Outputs already up to date
    pub unchanged: usize,
    pub errors: Vec<FileError>,
}

impl TransformReport {
    pub fn record(&mut self, written: Written) {
        match written {
            Written::Changed => self.written += 1,
            Written::Unchanged => self.unchanged += 1,
        }
    }

    /// Record a per-file failure, rendering the full error chain.
    pub fn fail(&mut self, path: &Path, err: impl Into<anyhow::Error>) {
        self.errors.push(FileError {
            path: path.to_path_buf(),
            message: format!("{:#}", err.into()),
        });
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for TransformReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written, {} unchanged", self.written, self.unchanged)?;
        if !self.errors.is_empty() {
            write!(f, ", {} failed", self.errors.len())?;
        }
        Ok(())
    }
}

// ============================================================================
// Output helpers
// ============================================================================

/// Whether [`write_if_changed`] touched the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    Changed,
    Unchanged,
}

/// Write `contents` to `path` unless it already holds exactly these bytes.
pub fn write_if_changed(path: &Path, contents: &[u8]) -> Result<Written, TransformError> {
    if fs::read(path).is_ok_and(|existing| existing == contents) {
        return Ok(Written::Unchanged);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TransformError::CreateDir(parent.to_path_buf(), e))?;
    }
    fs::write(path, contents).map_err(|e| TransformError::Write(path.to_path_buf(), e))?;
    Ok(Written::Changed)
}

pub fn read_to_string(path: &Path) -> Result<String, TransformError> {
    fs::read_to_string(path).map_err(|e| TransformError::Read(path.to_path_buf(), e))
}

pub fn ensure_dir(dir: &Path) -> Result<(), TransformError> {
    fs::create_dir_all(dir).map_err(|e| TransformError::CreateDir(dir.to_path_buf(), e))
}

/// Output path of `source` under `dest`, mirroring its path below the glob
/// base. `extension` replaces the source extension when given.
pub fn output_path(sources: &SourceSet, source: &Path, dest: &Path, extension: Option<&str>) -> PathBuf {
    let relative = sources
        .relative_to_base(source)
        .or_else(|| source.file_name().map(PathBuf::from))
        .unwrap_or_default();
    let out = dest.join(relative);
    match extension {
        Some(ext) => out.with_extension(ext),
        None => out,
    }
}
