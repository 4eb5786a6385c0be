//! Compiled source globs anchored at the project root.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::config::ConfigError;
use crate::utils::path::clean;

/// `*` stops at `/`, and dotfiles need an explicit leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// One glob pattern with its literal directory prefix.
#[derive(Debug, Clone)]
pub struct SourcePattern {
    raw: String,
    absolute: String,
    pattern: Pattern,
    base: PathBuf,
}

impl SourcePattern {
    fn new(root: &Path, raw: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::Glob {
            pattern: raw.to_owned(),
            message,
        };
        if raw.trim().is_empty() {
            return Err(invalid("pattern is empty".to_owned()));
        }

        let relative = raw.trim_start_matches("./");
        let (absolute, base) = if Path::new(relative).is_absolute() {
            (relative.to_owned(), glob_base(Path::new(""), relative))
        } else {
            let root_str = root.to_string_lossy();
            let escaped = Pattern::escape(root_str.trim_end_matches('/'));
            (format!("{escaped}/{relative}"), glob_base(root, relative))
        };
        let pattern = Pattern::new(&absolute).map_err(|e| invalid(e.msg.to_owned()))?;

        Ok(Self {
            raw: raw.to_owned(),
            absolute,
            pattern,
            base,
        })
    }

    /// Pattern as written in the config.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Literal directory prefix before the first wildcard component.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.pattern.matches_path_with(path, MATCH_OPTIONS)
    }
}

/// Literal leading directories of `pattern`, joined to `root`.
///
/// A pattern without wildcards names a single file; its base is the
/// file's parent directory.
fn glob_base(root: &Path, pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let literal = components
        .iter()
        .take_while(|c| !c.contains(['*', '?', '[', '{']))
        .count();
    let take = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };
    let mut base = root.to_path_buf();
    for component in &components[..take] {
        if component.is_empty() && base.as_os_str().is_empty() {
            base.push("/");
        } else if !component.is_empty() {
            base.push(component);
        }
    }
    clean(&base)
}

/// The compiled patterns of one category role (sources or partials).
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    patterns: Vec<SourcePattern>,
}

impl SourceSet {
    /// Compile `patterns` relative to `root`.
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| SourcePattern::new(root, p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[SourcePattern] {
        &self.patterns
    }

    /// Does any pattern match `path`?
    pub fn matches(&self, path: &Path) -> bool {
        self.pattern_for(path).is_some()
    }

    /// First pattern matching `path`.
    pub fn pattern_for(&self, path: &Path) -> Option<&SourcePattern> {
        self.patterns.iter().find(|p| p.matches(path))
    }

    /// Path of `path` below the glob base of the first pattern matching it.
    pub fn relative_to_base(&self, path: &Path) -> Option<PathBuf> {
        let pattern = self.pattern_for(path)?;
        path.strip_prefix(pattern.base()).ok().map(Path::to_path_buf)
    }

    /// Files matching any pattern right now, sorted and deduplicated.
    pub fn matched_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .patterns
            .iter()
            .filter_map(|p| glob::glob_with(&p.absolute, MATCH_OPTIONS).ok())
            .flat_map(|paths| paths.filter_map(Result::ok))
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        files.dedup();
        files
    }

    /// Distinct glob base directories, in pattern order.
    pub fn bases(&self) -> Vec<PathBuf> {
        let mut bases: Vec<PathBuf> = Vec::with_capacity(self.patterns.len());
        for pattern in &self.patterns {
            if !bases.iter().any(|b| b == pattern.base()) {
                bases.push(pattern.base().to_path_buf());
            }
        }
        bases
    }

    /// Union of two sets, patterns of `self` first.
    pub fn union(&self, other: &SourceSet) -> SourceSet {
        let mut patterns = self.patterns.clone();
        patterns.extend(other.patterns.iter().cloned());
        SourceSet { patterns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_glob_base() {
        let root = Path::new("/site");
        assert_eq!(
            glob_base(root, "src/assets/sass/**/*.scss"),
            PathBuf::from("/site/src/assets/sass")
        );
        assert_eq!(
            glob_base(root, "src/html/*.html"),
            PathBuf::from("/site/src/html")
        );
        assert_eq!(
            glob_base(root, "src/html/index.html"),
            PathBuf::from("/site/src/html")
        );
        assert_eq!(glob_base(root, "*.html"), PathBuf::from("/site"));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let set = SourceSet::new(Path::new("/site"), &["src/html/*.html"]).unwrap();
        assert!(set.matches(Path::new("/site/src/html/index.html")));
        assert!(!set.matches(Path::new("/site/src/html/partials/header.html")));
        assert!(!set.matches(Path::new("/elsewhere/src/html/index.html")));
    }

    #[test]
    fn test_double_star_recurses() {
        let set = SourceSet::new(Path::new("/site"), &["src/sass/**/*.scss"]).unwrap();
        assert!(set.matches(Path::new("/site/src/sass/main.scss")));
        assert!(set.matches(Path::new("/site/src/sass/pages/home.scss")));
        assert_eq!(
            set.relative_to_base(Path::new("/site/src/sass/pages/home.scss")),
            Some(PathBuf::from("pages/home.scss"))
        );
    }

    #[test]
    fn test_root_with_glob_characters_is_literal() {
        let set = SourceSet::new(Path::new("/work/[site]"), &["src/*.js"]).unwrap();
        assert!(set.matches(Path::new("/work/[site]/src/app.js")));
        assert!(!set.matches(Path::new("/work/s/src/app.js")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = SourceSet::new(Path::new("/site"), &["src/[*.js"]).unwrap_err();
        assert!(matches!(err, ConfigError::Glob { .. }));
        assert!(SourceSet::new(Path::new("/site"), &[" "]).is_err());
    }

    #[test]
    fn test_matched_files_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let js = dir.path().join("src/js");
        fs::create_dir_all(js.join("lib")).unwrap();
        fs::write(js.join("b.js"), "").unwrap();
        fs::write(js.join("a.js"), "").unwrap();
        fs::write(js.join("lib/c.js"), "").unwrap();
        fs::write(js.join(".hidden.js"), "").unwrap();

        let set = SourceSet::new(dir.path(), &["src/js/*.js", "src/js/**/*.js"]).unwrap();
        let files = set.matched_files();
        assert_eq!(
            files,
            vec![js.join("a.js"), js.join("b.js"), js.join("lib/c.js")]
        );
    }

    #[test]
    fn test_matched_files_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let set = SourceSet::new(dir.path(), &["src/fonts/*"]).unwrap();
        assert!(set.matched_files().is_empty());
    }

    #[test]
    fn test_union_and_bases() {
        let root = Path::new("/site");
        let sources = SourceSet::new(root, &["src/templates/*.jinja"]).unwrap();
        let partials = SourceSet::new(root, &["src/templates/partials/*.jinja"]).unwrap();
        let all = sources.union(&partials);
        assert!(all.matches(Path::new("/site/src/templates/partials/nav.jinja")));
        assert_eq!(
            all.bases(),
            vec![
                PathBuf::from("/site/src/templates"),
                PathBuf::from("/site/src/templates/partials")
            ]
        );
    }
}
