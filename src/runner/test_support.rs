//! Scripted adapters for runner and dispatcher tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::Task;
use crate::core::AssetCategory;
use crate::registry::SourceSet;
use crate::transform::{Transform, TransformReport, Written};

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    FileError,
    Error,
    Panic,
}

/// Records `"<name>:start"` and `"<name>:end"` into a shared log.
pub struct FakeTransform {
    pub name: &'static str,
    pub delay: Duration,
    pub behavior: Behavior,
    pub runs: Arc<AtomicUsize>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeTransform {
    pub fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name,
            delay: Duration::ZERO,
            behavior: Behavior::Succeed,
            runs: Arc::new(AtomicUsize::new(0)),
            log: Arc::clone(log),
        }
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }
}

impl Transform for FakeTransform {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, _sources: &SourceSet, _dest: &Path) -> anyhow::Result<TransformReport> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(format!("{}:start", self.name));
        std::thread::sleep(self.delay);
        self.log.lock().push(format!("{}:end", self.name));

        let mut report = TransformReport::default();
        match self.behavior {
            Behavior::Succeed => report.record(Written::Changed),
            Behavior::FileError => report.fail(Path::new("broken.txt"), anyhow::anyhow!("bad input")),
            Behavior::Error => anyhow::bail!("cannot create output"),
            Behavior::Panic => panic!("adapter bug"),
        }
        Ok(report)
    }
}

/// Wrap `transform` in a task over an empty scratch source set.
pub fn task(transform: FakeTransform, timeout: Duration) -> (Arc<Task>, Arc<AtomicUsize>) {
    let runs = Arc::clone(&transform.runs);
    let sources = SourceSet::new(Path::new("/nonexistent"), &["*.none"]).unwrap();
    let task = Task::new(
        AssetCategory::Fonts,
        sources,
        Path::new("/nonexistent/out").to_path_buf(),
        Arc::new(transform),
        timeout,
    );
    (Arc::new(task), runs)
}
