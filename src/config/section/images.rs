//! `[images]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [images]
//! optimize = true      # false copies every image verbatim
//! jpeg_quality = 80    # 1-100
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Image recompression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub optimize: bool,
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            jpeg_quality: 80,
        }
    }
}

impl ImagesConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(1..=100).contains(&self.jpeg_quality) {
            diag.error(
                FieldPath::new("images.jpeg_quality"),
                format!("must be between 1 and 100, got {}", self.jpeg_quality),
            );
        }
    }
}
