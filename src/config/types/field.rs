//! Dotted config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Path of a config field, e.g. `paths.styles.sources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// `[paths.<name>]` field for a category.
    pub const fn category(category: crate::core::AssetCategory, sources: bool) -> Self {
        use crate::core::AssetCategory::*;
        Self(match (category, sources) {
            (TemplateMarkup, true) => "paths.templates.sources",
            (TemplateMarkup, false) => "paths.templates.partials",
            (PlainMarkup, true) => "paths.html.sources",
            (PlainMarkup, false) => "paths.html.partials",
            (Styles, true) => "paths.styles.sources",
            (Styles, false) => "paths.styles.partials",
            (Fonts, true) => "paths.fonts.sources",
            (Fonts, false) => "paths.fonts.partials",
            (Images, true) => "paths.images.sources",
            (Images, false) => "paths.images.partials",
            (Scripts, true) => "paths.scripts.sources",
            (Scripts, false) => "paths.scripts.partials",
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}
