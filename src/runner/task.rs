//! A named, repeatable invocation of one transform adapter.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::core::AssetCategory;
use crate::registry::{CategoryEntry, SourceSet};
use crate::transform::{Transform, TransformReport};
use crate::{debug, log};

/// Observable state of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    Idle = 0,
    Running = 1,
    /// Timeout elapsed, the adapter has not returned yet
    StillRunning = 2,
    /// Last invocation reported errors
    Failed = 3,
}

impl TaskState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::StillRunning,
            3 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Result of one [`Task::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The adapter returned; per-file errors are in the report
    Completed(TransformReport),
    /// The adapter could not run, or panicked
    Failed(String),
    /// The timeout elapsed first; the work continues in the background
    TimedOut,
    /// The previous invocation had not finished
    Skipped,
}

impl TaskOutcome {
    /// Whether this outcome should count against the build.
    pub fn is_failure(&self) -> bool {
        match self {
            Self::Completed(report) => !report.is_ok(),
            Self::Failed(_) | Self::TimedOut => true,
            Self::Skipped => false,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(report) => write!(f, "{report}"),
            Self::Failed(message) => write!(f, "failed: {message}"),
            Self::TimedOut => f.write_str("timed out, still running"),
            Self::Skipped => f.write_str("skipped, previous run in progress"),
        }
    }
}

/// Binds one adapter to one category's sources and destination.
///
/// Built once at startup and shared as `Arc<Task>` between the initial
/// build and the watch bindings.
pub struct Task {
    name: String,
    category: AssetCategory,
    sources: SourceSet,
    dest: PathBuf,
    transform: Arc<dyn Transform>,
    timeout: Duration,
    state: AtomicU8,
    /// Set from dispatch until the adapter returns, even after a timeout
    in_flight: AtomicBool,
    finished: Notify,
}

impl Task {
    pub fn new(
        category: AssetCategory,
        sources: SourceSet,
        dest: PathBuf,
        transform: Arc<dyn Transform>,
        timeout: Duration,
    ) -> Self {
        Self {
            name: transform.name().to_owned(),
            category,
            sources,
            dest,
            transform,
            timeout,
            state: AtomicU8::new(TaskState::Idle as u8),
            in_flight: AtomicBool::new(false),
            finished: Notify::new(),
        }
    }

    /// Task for a registry entry: compiles `sources`, writes into `dest`.
    pub fn for_entry(entry: &CategoryEntry, transform: Arc<dyn Transform>, timeout: Duration) -> Self {
        Self::new(
            entry.category,
            entry.sources.clone(),
            entry.dest.clone(),
            transform,
            timeout,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> AssetCategory {
        self.category
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Wait until no invocation of the adapter is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let mut notified = std::pin::pin!(self.finished.notified());
            notified.as_mut().enable();
            if !self.in_flight.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// Run the adapter on the blocking pool.
    ///
    /// Resolves exactly once per call, whether the adapter succeeds, errors,
    /// panics or outlives the timeout.
    pub async fn run(self: &Arc<Self>) -> TaskOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!(&self.name; "previous run still in progress, skipping");
            return TaskOutcome::Skipped;
        }
        self.set_state(TaskState::Running);

        let task = Arc::clone(self);
        let handle = tokio::task::spawn_blocking(move || task.execute());

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                // Blocking task cancelled before it ran (runtime shutdown)
                self.finish(TaskState::Failed);
                TaskOutcome::Failed(e.to_string())
            }
            Err(_) => {
                let _ = self.state.compare_exchange(
                    TaskState::Running as u8,
                    TaskState::StillRunning as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                log!(&self.name; "still running after {}s", self.timeout.as_secs_f32());
                TaskOutcome::TimedOut
            }
        }
    }

    /// Body of the blocking job. Updates state itself so late completions
    /// after a timeout are still recorded.
    fn execute(&self) -> TaskOutcome {
        let start = Instant::now();
        let result = catch_unwind(AssertUnwindSafe(|| self.transform.run(&self.sources, &self.dest)));

        let outcome = match result {
            Ok(Ok(report)) => {
                for error in &report.errors {
                    log!(&self.name; "{}: {}", error.path.display(), error.message);
                }
                TaskOutcome::Completed(report)
            }
            Ok(Err(e)) => {
                log!(&self.name; "{:#}", e);
                TaskOutcome::Failed(format!("{e:#}"))
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                log!(&self.name; "panicked: {}", message);
                TaskOutcome::Failed(format!("panicked: {message}"))
            }
        };
        debug!(&self.name; "{} in {:?}", outcome, start.elapsed());

        let state = if outcome.is_failure() { TaskState::Failed } else { TaskState::Idle };
        self.finish(state);
        outcome
    }

    fn finish(&self, state: TaskState) {
        self.set_state(state);
        self.in_flight.store(false, Ordering::Release);
        self.finished.notify_waiters();
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("dest", &self.dest)
            .field("state", &self.state())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
