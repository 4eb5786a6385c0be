//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! browsers = ["last 2 versions", "> 1%"]   # browserslist queries for prefixing
//! minify = true
//! source_map = true                       # Write `<name>.css.map` next to each stylesheet
//! ```

use lightningcss::targets::{Browsers, Targets};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Stylesheet compilation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Browserslist queries used for vendor-prefix fallbacks.
    pub browsers: Vec<String>,
    pub minify: bool,
    pub source_map: bool,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            browsers: vec!["defaults".to_owned()],
            minify: true,
            source_map: true,
        }
    }
}

impl StylesConfig {
    /// Resolve `browsers` into lightningcss targets.
    ///
    /// An empty query list means no prefixing.
    pub fn targets(&self) -> Result<Targets, String> {
        if self.browsers.is_empty() {
            return Ok(Targets::default());
        }
        let browsers = Browsers::from_browserslist(&self.browsers).map_err(|e| e.to_string())?;
        Ok(Targets {
            browsers,
            ..Targets::default()
        })
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = self.targets() {
            diag.error_with_hint(
                FieldPath::new("styles.browsers"),
                format!("invalid browserslist query: {e}"),
                "see https://browsersl.ist for the query syntax",
            );
        }
    }
}
