//! Asset category definitions.

use std::fmt;

/// Logical asset category, each with its own sources, destination and task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetCategory {
    /// Templated markup (`.jinja`) rendered to HTML
    TemplateMarkup,
    /// Plain HTML with `@@include` directives
    PlainMarkup,
    /// SCSS compiled to CSS
    Styles,
    /// Fonts, copied verbatim
    Fonts,
    /// Raster and vector images, recompressed
    Images,
    /// JavaScript modules bundled into one file
    Scripts,
}

impl AssetCategory {
    /// All categories in registration order.
    pub const ALL: [Self; 6] = [
        Self::TemplateMarkup,
        Self::PlainMarkup,
        Self::Styles,
        Self::Fonts,
        Self::Images,
        Self::Scripts,
    ];

    /// Name used for log prefixes, task names and config sections.
    pub const fn name(self) -> &'static str {
        match self {
            Self::TemplateMarkup => "templates",
            Self::PlainMarkup => "html",
            Self::Styles => "styles",
            Self::Fonts => "fonts",
            Self::Images => "images",
            Self::Scripts => "scripts",
        }
    }

    /// Position in [`AssetCategory::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this category produces markup pages.
    pub const fn is_markup(self) -> bool {
        matches!(self, Self::TemplateMarkup | Self::PlainMarkup)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
