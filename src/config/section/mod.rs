//! Configuration section definitions.
//!
//! Each module corresponds to a section in `kiln.toml`:
//!
//! | Module    | TOML Section          | Purpose                          |
//! |-----------|-----------------------|----------------------------------|
//! | `paths`   | `[paths.<category>]`  | Source globs and destinations    |
//! | `serve`   | `[serve]`             | Development server               |
//! | `build`   | `[build]`             | Task runner                      |
//! | `styles`  | `[styles]`            | SCSS/CSS pipeline                |
//! | `scripts` | `[scripts]`           | Script bundle                    |
//! | `images`  | `[images]`            | Image recompression              |

mod build;
mod images;
mod paths;
mod scripts;
mod serve;
mod styles;

pub use build::BuildConfig;
pub use images::ImagesConfig;
pub use paths::{CategoryOverride, CategoryPaths, PathsConfig};
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use styles::StylesConfig;
