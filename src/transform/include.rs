//! Plain-markup adapter: `@@include` resolution and pretty-printing.
//!
//! ```html
//! @@include('partials/header.html')
//! @@include('partials/card.html', {"title": "Hello", "meta": {"tag": "news"}})
//! ```
//!
//! Paths are relative to the including file. Inside an included file,
//! `@@title` or `@@meta.tag` is replaced by the matching parameter; names
//! without a value are left untouched. Parameters flow into nested includes.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};
use thiserror::Error;

use super::{Transform, TransformReport, ensure_dir, output_path, prettify, read_to_string, write_if_changed};
use crate::registry::SourceSet;
use crate::utils::path::{clean, normalize_path};

static RE_INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)@@include\(\s*(?:'([^']+)'|"([^"]+)")\s*(?:,\s*(\{.*?\})\s*)?\)"#).unwrap()
});

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@@([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)").unwrap());

#[derive(Debug, Error)]
pub enum IncludeError {
    #[error("included file `{path}` not found (from `{from}`)")]
    NotFound { path: PathBuf, from: PathBuf },

    #[error("include cycle: {0}")]
    Cycle(String),

    #[error("invalid parameters for `{path}`: {message}")]
    Params { path: String, message: String },

    #[error(transparent)]
    Io(#[from] super::TransformError),
}

/// Resolves `@@include` directives in plain HTML pages.
pub struct IncludeTransform;

impl Transform for IncludeTransform {
    fn name(&self) -> &'static str {
        "html"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        ensure_dir(dest)?;
        let mut report = TransformReport::default();

        for source in sources.matched_files() {
            let result = expand_file(&source)
                .map_err(anyhow::Error::from)
                .and_then(|html| {
                    let out = output_path(sources, &source, dest, Some("html"));
                    Ok(write_if_changed(&out, prettify(&html).as_bytes())?)
                });
            match result {
                Ok(written) => report.record(written),
                Err(e) => report.fail(&source, e),
            }
        }
        Ok(report)
    }
}

/// Expand every include of the page at `path`.
pub fn expand_file(path: &Path) -> Result<String, IncludeError> {
    let path = normalize_path(path);
    let content = read_to_string(&path)?;
    let mut stack = vec![path.clone()];
    expand(&content, &path, &Map::new(), &mut stack)
}

fn expand(
    content: &str,
    file: &Path,
    params: &Map<String, Value>,
    stack: &mut Vec<PathBuf>,
) -> Result<String, IncludeError> {
    let dir = file.parent().unwrap_or(Path::new(""));
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for caps in RE_INCLUDE.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&substitute(&content[last..whole.start()], params));
        last = whole.end();

        let target = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let child_params = child_params(params, target, caps.get(3).map(|m| m.as_str()))?;

        let resolved = clean(&dir.join(target));
        if !resolved.is_file() {
            return Err(IncludeError::NotFound {
                path: resolved,
                from: file.to_path_buf(),
            });
        }
        if let Some(pos) = stack.iter().position(|p| *p == resolved) {
            let chain: Vec<String> = stack[pos..]
                .iter()
                .chain(std::iter::once(&resolved))
                .map(|p| display_name(p))
                .collect();
            return Err(IncludeError::Cycle(chain.join(" -> ")));
        }

        let included = read_to_string(&resolved)?;
        stack.push(resolved.clone());
        let expanded = expand(&included, &resolved, &child_params, stack)?;
        stack.pop();
        out.push_str(&expanded);
    }

    out.push_str(&substitute(&content[last..], params));
    Ok(out)
}

fn child_params(
    parent: &Map<String, Value>,
    target: &str,
    json: Option<&str>,
) -> Result<Map<String, Value>, IncludeError> {
    let mut params = parent.clone();
    if let Some(json) = json {
        let value: Value = serde_json::from_str(json).map_err(|e| IncludeError::Params {
            path: target.to_owned(),
            message: e.to_string(),
        })?;
        if let Value::Object(map) = value {
            params.extend(map);
        }
    }
    Ok(params)
}

/// Replace `@@name` references that have a value in `params`.
fn substitute(text: &str, params: &Map<String, Value>) -> String {
    if params.is_empty() || !text.contains("@@") {
        return text.to_owned();
    }
    RE_VARIABLE
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            match lookup(params, name) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
                None => caps[0].to_owned(),
            }
        })
        .into_owned()
}

fn lookup<'a>(params: &'a Map<String, Value>, dotted: &str) -> Option<&'a Value> {
    let mut parts = dotted.split('.');
    let mut value = params.get(parts.next()?)?;
    for part in parts {
        value = value.as_object()?.get(part)?;
    }
    Some(value)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::{read, write};

    #[test]
    fn test_include_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/html/index.html", "<body>@@include('partials/nav.html')</body>");
        write(root, "src/html/partials/nav.html", "<nav>@@include(\"../blocks/link.html\")</nav>");
        write(root, "src/html/blocks/link.html", "<a href=\"/\">Home</a>");

        let html = expand_file(&root.join("src/html/index.html")).unwrap();
        assert_eq!(html, "<body><nav><a href=\"/\">Home</a></nav></body>");
    }

    #[test]
    fn test_parameters_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "src/html/index.html",
            "@@include('card.html', {\"title\": \"Hi\", \"meta\": {\"n\": 3}})",
        );
        write(root, "src/html/card.html", "<h2>@@title</h2><p>@@meta.n @@missing</p>");

        let html = expand_file(&root.join("src/html/index.html")).unwrap();
        assert_eq!(html, "<h2>Hi</h2><p>3 @@missing</p>");
    }

    #[test]
    fn test_parameters_reach_nested_includes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a.html", "@@include('b.html', {\"who\": \"kiln\"})");
        write(root, "b.html", "[@@include('c.html')]");
        write(root, "c.html", "hello @@who");

        assert_eq!(expand_file(&root.join("a.html")).unwrap(), "[hello kiln]");
    }

    #[test]
    fn test_cycle_detected() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a.html", "@@include('b.html')");
        write(root, "b.html", "@@include('a.html')");

        let err = expand_file(&root.join("a.html")).unwrap_err();
        assert!(matches!(err, IncludeError::Cycle(_)));
        assert_eq!(err.to_string(), "include cycle: a.html -> b.html -> a.html");
    }

    #[test]
    fn test_missing_include() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.html", "@@include('nope.html')");
        let err = expand_file(&dir.path().join("a.html")).unwrap_err();
        assert!(matches!(err, IncludeError::NotFound { .. }));
    }

    #[test]
    fn test_transform_writes_pretty_pages_and_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/html/index.html", "<html><body>@@include('partials/footer.html')</body></html>");
        write(root, "src/html/broken.html", "@@include('partials/missing.html')");
        write(root, "src/html/partials/footer.html", "<footer><p>bye</p></footer>");

        let sources = SourceSet::new(root, &["src/html/*.html"]).unwrap();
        let dest = root.join("dist");
        let report = IncludeTransform.run(&sources, &dest).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("broken.html"));
        assert_eq!(
            read(&dest, "index.html"),
            "<html>\n  <body>\n    <footer>\n      <p>bye</p>\n    </footer>\n  </body>\n</html>\n"
        );
        assert!(!dest.join("partials").exists());

        let again = IncludeTransform.run(&sources, &dest).unwrap();
        assert_eq!(again.written, 0);
        assert_eq!(again.unchanged, 1);
    }
}
