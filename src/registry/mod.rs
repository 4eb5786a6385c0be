//! Path registry: asset categories mapped to source globs and destinations.
//!
//! Built once at startup from `[paths]`, validated, then shared read-only by
//! the task runner and the watch dispatcher.
//!
//! Validation rejects:
//! - patterns that fail to parse
//! - the same pattern string in two categories
//! - any file existing at startup that matches two categories

mod source;

pub use source::{SourcePattern, SourceSet};

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::config::{ConfigDiagnostics, ConfigError, FieldPath, PathsConfig};
use crate::core::AssetCategory;
use crate::utils::path::{normalize_path, slash_relative};

/// Sources, watch-only partials and destination of one category.
#[derive(Debug, Clone)]
pub struct CategoryEntry {
    pub category: AssetCategory,
    pub sources: SourceSet,
    pub partials: SourceSet,
    /// Absolute destination directory
    pub dest: PathBuf,
}

impl CategoryEntry {
    /// Everything whose change should rebuild this category.
    pub fn watch_set(&self) -> SourceSet {
        self.sources.union(&self.partials)
    }
}

/// Static category → paths mapping.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    /// Indexed by `AssetCategory::index()`
    entries: Vec<CategoryEntry>,
}

impl PathRegistry {
    /// Compile and validate every category of `paths` against `root`.
    pub fn new(root: &Path, paths: &PathsConfig) -> Result<Self, ConfigError> {
        let root = normalize_path(root);
        let mut diag = ConfigDiagnostics::new();
        let mut entries = Vec::with_capacity(AssetCategory::ALL.len());

        for category in AssetCategory::ALL {
            let resolved = paths.resolve(category);
            let sources = compile(&root, &resolved.sources, category, true, &mut diag);
            let partials = compile(&root, &resolved.partials, category, false, &mut diag);
            if resolved.sources.is_empty() {
                diag.warn(
                    FieldPath::category(category, true),
                    "no source patterns, category builds nothing",
                );
            }
            entries.push(CategoryEntry {
                category,
                sources,
                partials,
                dest: root.join(&resolved.dest),
            });
        }

        if !diag.has_errors() {
            check_duplicate_patterns(&entries, &mut diag);
        }
        if !diag.has_errors() {
            check_overlapping_files(&root, &entries, &mut diag);
        }

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)?;
        Ok(Self { entries })
    }

    /// Paths of `category`.
    pub fn entry(&self, category: AssetCategory) -> &CategoryEntry {
        &self.entries[category.index()]
    }
}

fn compile(
    root: &Path,
    patterns: &[String],
    category: AssetCategory,
    sources: bool,
    diag: &mut ConfigDiagnostics,
) -> SourceSet {
    match SourceSet::new(root, patterns) {
        Ok(set) => set,
        Err(e) => {
            diag.error(FieldPath::category(category, sources), e.to_string());
            SourceSet::default()
        }
    }
}

fn check_duplicate_patterns(entries: &[CategoryEntry], diag: &mut ConfigDiagnostics) {
    let mut seen: FxHashMap<&str, AssetCategory> = FxHashMap::default();
    for entry in entries {
        let all = entry.sources.patterns().iter().map(|p| (p, true));
        let all = all.chain(entry.partials.patterns().iter().map(|p| (p, false)));
        for (pattern, is_source) in all {
            match seen.get(pattern.as_str()) {
                Some(&owner) if owner != entry.category => diag.error_with_hint(
                    FieldPath::category(entry.category, is_source),
                    format!("`{}` is already used by `{owner}`", pattern.as_str()),
                    "each file must belong to exactly one category",
                ),
                Some(_) => {}
                None => {
                    seen.insert(pattern.as_str(), entry.category);
                }
            }
        }
    }
}

fn check_overlapping_files(root: &Path, entries: &[CategoryEntry], diag: &mut ConfigDiagnostics) {
    let mut owners: FxHashMap<PathBuf, AssetCategory> = FxHashMap::default();
    for entry in entries {
        for file in entry.watch_set().matched_files() {
            match owners.get(&file) {
                Some(&owner) if owner != entry.category => diag.error_with_hint(
                    FieldPath::category(entry.category, true),
                    format!(
                        "`{}` matches both `{owner}` and `{}`",
                        slash_relative(&file, root),
                        entry.category
                    ),
                    "narrow one of the patterns",
                ),
                Some(_) => {}
                None => {
                    owners.insert(file, entry.category);
                }
            }
        }
    }
}
