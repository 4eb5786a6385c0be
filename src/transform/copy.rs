//! Font/asset copier: files are copied verbatim.

use std::fs;
use std::path::Path;

use super::{Transform, TransformError, TransformReport, ensure_dir, output_path, write_if_changed};
use crate::registry::SourceSet;

pub struct CopyTransform;

impl Transform for CopyTransform {
    fn name(&self) -> &'static str {
        "fonts"
    }

    fn run(&self, sources: &SourceSet, dest: &Path) -> anyhow::Result<TransformReport> {
        ensure_dir(dest)?;
        let mut report = TransformReport::default();

        for source in sources.matched_files() {
            let out = output_path(sources, &source, dest, None);
            let result = fs::read(&source)
                .map_err(|e| TransformError::Read(source.clone(), e))
                .and_then(|bytes| write_if_changed(&out, &bytes));
            match result {
                Ok(written) => report.record(written),
                Err(e) => report.fail(&source, e),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::write;

    #[test]
    fn test_copies_verbatim_and_keeps_stale_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/fonts/a.woff2", "AAAA");
        write(root, "src/fonts/b.ttf", "BBBB");

        let sources = SourceSet::new(root, &["src/fonts/*"]).unwrap();
        let dest = root.join("dist/fonts");
        let report = CopyTransform.run(&sources, &dest).unwrap();
        assert_eq!(report.written, 2);
        assert_eq!(fs::read(dest.join("a.woff2")).unwrap(), b"AAAA");

        // Deleting a source leaves its output in place
        fs::remove_file(root.join("src/fonts/b.ttf")).unwrap();
        let report = CopyTransform.run(&sources, &dest).unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.written, 0);
        assert_eq!(fs::read(dest.join("b.ttf")).unwrap(), b"BBBB");
    }
}
