//! `[paths.<category>]` section configuration.
//!
//! Maps each asset category to its source globs, watch-only partial globs
//! and destination directory. Any field left out keeps its default.
//!
//! # Example
//!
//! ```toml
//! [paths.styles]
//! sources = ["src/assets/sass/**/*.scss"]
//! dest = "dist/assets/css"
//!
//! [paths.html]
//! partials = ["src/html/partials/*.html", "src/html/blocks/*.html"]
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::AssetCategory;

/// Per-category overrides as written in `kiln.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOverride {
    pub sources: Option<Vec<String>>,
    pub partials: Option<Vec<String>>,
    pub dest: Option<PathBuf>,
}

/// Resolved paths of one category, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryPaths {
    pub sources: Vec<String>,
    pub partials: Vec<String>,
    pub dest: PathBuf,
}

impl CategoryPaths {
    /// Built-in layout for `category`.
    pub fn default_for(category: AssetCategory) -> Self {
        let (sources, partials, dest): (&[&str], &[&str], &str) = match category {
            AssetCategory::TemplateMarkup => (
                &["src/templates/*.jinja"],
                &["src/templates/partials/*.jinja"],
                "dist",
            ),
            AssetCategory::PlainMarkup => {
                (&["src/html/*.html"], &["src/html/partials/*.html"], "dist")
            }
            AssetCategory::Styles => (&["src/assets/sass/**/*.scss"], &[], "dist/assets/css"),
            AssetCategory::Fonts => (&["src/assets/fonts/*"], &[], "dist/assets/fonts"),
            AssetCategory::Images => (&["src/assets/img/*"], &[], "dist/assets/img"),
            AssetCategory::Scripts => (&["src/assets/js/**/*.js"], &[], "dist/assets/js"),
        };
        Self {
            sources: sources.iter().map(|s| (*s).to_owned()).collect(),
            partials: partials.iter().map(|s| (*s).to_owned()).collect(),
            dest: PathBuf::from(dest),
        }
    }
}

/// `[paths]` section: one optional override table per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub templates: CategoryOverride,
    pub html: CategoryOverride,
    pub styles: CategoryOverride,
    pub fonts: CategoryOverride,
    pub images: CategoryOverride,
    pub scripts: CategoryOverride,
}

impl PathsConfig {
    fn override_for(&self, category: AssetCategory) -> &CategoryOverride {
        match category {
            AssetCategory::TemplateMarkup => &self.templates,
            AssetCategory::PlainMarkup => &self.html,
            AssetCategory::Styles => &self.styles,
            AssetCategory::Fonts => &self.fonts,
            AssetCategory::Images => &self.images,
            AssetCategory::Scripts => &self.scripts,
        }
    }

    /// Paths of `category`: overrides merged over the built-in layout.
    pub fn resolve(&self, category: AssetCategory) -> CategoryPaths {
        let mut paths = CategoryPaths::default_for(category);
        let over = self.override_for(category);
        if let Some(sources) = &over.sources {
            paths.sources.clone_from(sources);
        }
        if let Some(partials) = &over.partials {
            paths.partials.clone_from(partials);
        }
        if let Some(dest) = &over.dest {
            paths.dest.clone_from(dest);
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        let styles = config.paths.resolve(AssetCategory::Styles);
        assert_eq!(styles.sources, vec!["src/assets/sass/**/*.scss"]);
        assert!(styles.partials.is_empty());
        assert_eq!(styles.dest, PathBuf::from("dist/assets/css"));

        let templates = config.paths.resolve(AssetCategory::TemplateMarkup);
        assert_eq!(templates.partials, vec!["src/templates/partials/*.jinja"]);
        assert_eq!(templates.dest, PathBuf::from("dist"));
    }

    #[test]
    fn test_partial_override_keeps_other_fields() {
        let config = test_parse_config("[paths.scripts]\ndest = \"public/js\"");
        let scripts = config.paths.resolve(AssetCategory::Scripts);
        assert_eq!(scripts.dest, PathBuf::from("public/js"));
        assert_eq!(scripts.sources, vec!["src/assets/js/**/*.js"]);
    }

    #[test]
    fn test_empty_partials_override() {
        let config = test_parse_config("[paths.html]\npartials = []");
        assert!(config.paths.resolve(AssetCategory::PlainMarkup).partials.is_empty());
    }
}
