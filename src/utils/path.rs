//! Path normalization utilities.
//!
//! Pure functions for path manipulation. No side effects.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            clean(path)
        } else {
            std::env::current_dir()
                .map_or_else(|_| path.to_path_buf(), |cwd| clean(&cwd.join(path)))
        }
    })
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
///
/// Used for files that may not exist yet (removed files, unresolved imports).
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `path` relative to `base`, with `/` separators.
///
/// Falls back to the full path when `path` is outside `base`.
pub fn slash_relative(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_clean_parent_components() {
        assert_eq!(
            clean(Path::new("/site/src/js/../lib/./util.js")),
            PathBuf::from("/site/src/lib/util.js")
        );
        assert_eq!(clean(Path::new("../a/b")), PathBuf::from("../a/b"));
    }

    #[test]
    fn test_slash_relative() {
        assert_eq!(
            slash_relative(
                Path::new("/site/src/sass/pages/home.scss"),
                Path::new("/site/src/sass")
            ),
            "pages/home.scss"
        );
        assert_eq!(
            slash_relative(Path::new("/other/a.js"), Path::new("/site")),
            "/other/a.js"
        );
    }
}
