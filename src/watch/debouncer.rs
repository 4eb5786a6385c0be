use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::debug;
use crate::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;

/// Pure debouncer: only handles timing and event deduplication.
pub(super) struct Debouncer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self::with_window(Duration::from_millis(DEBOUNCE_MS))
    }

    pub(super) fn with_window(window: Duration) -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            window,
        }
    }

    /// Add a notify event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → nothing (file came and went)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            if let Some(&existing) = self.changes.get(&path) {
                match (existing, kind) {
                    (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                        self.changes.insert(path, kind);
                    }
                    (ChangeKind::Modified, ChangeKind::Removed) => {
                        self.changes.insert(path, ChangeKind::Removed);
                    }
                    (ChangeKind::Created, ChangeKind::Removed) => {
                        debug!("watch"; "discard created+removed: {}", path.display());
                        self.changes.remove(&path);
                    }
                    _ => continue,
                }
                self.last_event = Some(Instant::now());
                continue;
            }

            debug!("watch"; "{}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            self.last_event = Some(Instant::now());
        }
    }

    /// Changed paths, sorted, once the window has been quiet.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let mut paths: Vec<PathBuf> = std::mem::take(&mut self.changes).into_keys().collect();
        paths.sort();
        Some(paths)
    }

    pub(super) fn is_ready(&self) -> bool {
        match self.last_event {
            Some(last) => last.elapsed() >= self.window && !self.changes.is_empty(),
            None => false,
        }
    }

    /// Time until the window closes, or `idle` with nothing pending.
    pub(super) fn sleep_duration(&self, idle: Duration) -> Duration {
        match self.last_event {
            Some(last) => self
                .window
                .saturating_sub(last.elapsed())
                .max(Duration::from_millis(1)),
            None => idle,
        }
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with("#")
}
