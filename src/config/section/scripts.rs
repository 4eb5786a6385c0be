//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! target = "es2015"    # Syntax level the bundle is lowered to
//! output = "main.js"   # Bundle file name inside the scripts destination
//! minify = true
//! ```

use oxc::transformer::TransformOptions;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Script bundling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub target: String,
    pub output: String,
    pub minify: bool,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            target: "es2015".to_owned(),
            output: "main.js".to_owned(),
            minify: true,
        }
    }
}

impl ScriptsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if let Err(e) = TransformOptions::from_target(&self.target) {
            diag.error_with_hint(
                FieldPath::new("scripts.target"),
                format!("unsupported target `{}`: {e}", self.target),
                "use an ECMAScript version such as \"es2015\" or \"es2020\"",
            );
        }
        if self.output.is_empty() || self.output.contains(['/', '\\']) {
            diag.error(
                FieldPath::new("scripts.output"),
                "must be a plain file name",
            );
        }
    }
}
