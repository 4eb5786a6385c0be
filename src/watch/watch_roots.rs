use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::debug;

/// Glob base directories to watch, re-attached when they reappear.
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    /// Watch every root that exists now; missing ones are skipped.
    pub(super) fn attach_existing(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                debug!("watch"; "skipping missing {}", path.display());
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                debug!("watch"; "attached watch: {}", path.display());
            }
        }
    }

    pub(super) fn attached_count(&self) -> usize {
        self.attached.len()
    }
}

/// Drop roots nested inside another root; a recursive watch covers them.
pub(super) fn outermost(mut roots: Vec<PathBuf>) -> Vec<PathBuf> {
    roots.sort();
    roots.dedup();
    let mut kept: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        if !kept.iter().any(|k| root.starts_with(k)) {
            kept.push(root);
        }
    }
    kept
}
