//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths.<category>]
//! │   ├── serve      # [serve]
//! │   ├── build      # [build]
//! │   ├── styles     # [styles]
//! │   ├── scripts    # [scripts]
//! │   └── images     # [images]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # KilnConfig (this file)
//! ```
//!
//! A missing `kiln.toml` is not an error: every section has defaults and
//! the current directory becomes the project root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildConfig, CategoryOverride, CategoryPaths, ImagesConfig, PathsConfig, ScriptsConfig,
    ServeConfig, StylesConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{cli::Cli, debug, log, utils::path::normalize_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "kiln.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KilnConfig {
    /// Absolute path to the config file, empty when running on defaults
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Source globs and destinations per category
    #[serde(default)]
    pub paths: PathsConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Task runner settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Stylesheet settings
    #[serde(default)]
    pub styles: StylesConfig,

    /// Script bundle settings
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Image settings
    #[serde(default)]
    pub images: ImagesConfig,
}

impl KilnConfig {
    /// Locate, parse and validate the configuration for `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let path = normalize_path(&path);
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = path;
                config.root = root;
                config
            }
            None => {
                if cli.config != Path::new(CONFIG_FILE) {
                    log!("warning"; "{} not found, using defaults", cli.config.display());
                } else {
                    debug!("config"; "no {CONFIG_FILE}, using defaults");
                }
                Self {
                    root: normalize_path(&cwd),
                    ..Self::default()
                }
            }
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-line overrides on top of the parsed file.
    fn apply_cli(&mut self, cli: &Cli) {
        let Some(args) = cli.serve_args() else {
            return;
        };
        Self::update_option(&mut self.serve.interface, args.interface.as_ref());
        Self::update_option(&mut self.serve.port, args.port.as_ref());
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.serve.validate(&mut diag);
        self.build.validate(&mut diag);
        self.styles.validate(&mut diag);
        self.scripts.validate(&mut diag);
        self.images.validate(&mut diag);

        diag.print_warnings();
        diag.into_result().map_err(ConfigError::Diagnostics)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> KilnConfig {
    let (parsed, ignored) = KilnConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = KilnConfig::from_str("[serve\nport = 3000");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_kiln_config_default() {
        let config = KilnConfig::default();

        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.build.task_timeout, 120);
        assert!(config.styles.minify);
        assert_eq!(config.scripts.target, "es2015");
        assert_eq!(config.images.jpeg_quality, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[serve]\nport = 4000\n[paths.styles]\nsource = [\"x\"]\n[unknown_section]\nfield = 1";
        let (config, ignored) = KilnConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.serve.port, 4000);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
        assert!(ignored.iter().any(|f| f == "paths.styles.source"));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[serve]\nport = 4000\n[paths.fonts]\ndest = \"out/fonts\"";
        let (_, ignored) = KilnConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[build]\ntask_timeout = 0\n[images]\njpeg_quality = 101\n[scripts]\noutput = \"\"",
        );
        let Err(ConfigError::Diagnostics(diag)) = config.validate() else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_cli_overrides_port() {
        let mut config = test_parse_config("[serve]\nport = 4000");
        let cli = Cli::parse_from(["kiln", "html", "--port", "5000"]);
        config.apply_cli(&cli);
        assert_eq!(config.serve.port, 5000);

        let mut config = test_parse_config("[serve]\nport = 4000");
        let cli = Cli::parse_from(["kiln", "build"]);
        config.apply_cli(&cli);
        assert_eq!(config.serve.port, 4000);
    }

    #[test]
    fn test_from_path_sets_nothing_implicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[paths.images]\ndest = \"public/img\"").unwrap();
        let config = KilnConfig::from_path(&path).unwrap();
        assert_eq!(
            config.paths.images.dest.as_deref(),
            Some(Path::new("public/img"))
        );
        assert!(config.root.as_os_str().is_empty());
    }
}
