//! URL to filesystem path resolution.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve URL to a file under `serve_root`, handling index.html for directories.
///
/// Returns `None` for missing files and for anything that escapes the root,
/// including through symlinks.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Decode, strip query string and fragment, trim slashes.
fn normalize_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(path));
    decoded.replace('\\', "/").trim_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("dist/assets/css")).unwrap();
        fs::write(root.join("dist/index.html"), "<p>home</p>").unwrap();
        fs::write(root.join("dist/assets/css/main.css"), "body{}").unwrap();
        fs::write(root.join("dist/my page.html"), "spaces").unwrap();
        fs::write(root.join("secret.txt"), "outside").unwrap();
        dir
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/assets/css/main.css?v=3"), "assets/css/main.css");
        assert_eq!(normalize_url("/my%20page.html#top"), "my page.html");
        assert_eq!(normalize_url("/"), "");
    }

    #[test]
    fn test_resolve_files_and_index() {
        let dir = site();
        let root = dir.path().join("dist");

        let index = resolve_path("/", &root).unwrap();
        assert!(index.ends_with("index.html"));
        assert!(resolve_path("/assets/css/main.css?x=1", &root).unwrap().ends_with("main.css"));
        assert!(resolve_path("/my%20page.html", &root).is_some());
        assert!(resolve_path("/missing.html", &root).is_none());
        assert!(resolve_path("/assets", &root).is_none());
    }

    #[test]
    fn test_rejects_escape() {
        let dir = site();
        let root = dir.path().join("dist");
        assert!(resolve_path("/../secret.txt", &root).is_none());
        assert!(resolve_path("/%2e%2e/secret.txt", &root).is_none());
    }
}
