//! Watch dispatcher: file changes → binding task series → one reload.
//!
//! Each [`WatchBinding`] runs on its own tokio task:
//!
//! ```text
//! Idle ──trigger──► Dispatching (series) ──► Notifying (one signal) ──► Idle
//!                       ▲        │
//!                       └────────┘ triggers that arrived meanwhile
//! ```
//!
//! A task skipped because its previous run was still going is awaited and
//! the series runs again, so no change goes unbuilt. Bindings are
//! independent of each other. The router drops paths that match more than
//! one binding.

mod debouncer;
mod router;
mod types;
mod watch_roots;
mod watcher;


pub use types::{BindingState, WatchBinding};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logger;
use crate::reload::ReloadSignal;
use crate::runner::{self, TaskOutcome};
use crate::{debug, log};

use router::Router;
use types::{StateCell, Trigger};
use watcher::FsWatcher;

pub struct WatchDispatcher {
    bindings: Vec<WatchBinding>,
    signal: Arc<dyn ReloadSignal>,
}

impl WatchDispatcher {
    pub fn new(bindings: Vec<WatchBinding>, signal: Arc<dyn ReloadSignal>) -> Self {
        Self { bindings, signal }
    }

    /// Start the bindings and a filesystem watcher feeding them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Result<DispatcherHandle> {
        let mut handle = self.start_bindings();
        let watcher = FsWatcher::new(handle.router.bases(), Arc::clone(&handle.router))?;
        handle.watcher = Some(watcher.spawn());
        log!("watch"; "watching for changes");
        Ok(handle)
    }

    /// Start the bindings only; feed them with [`DispatcherHandle::dispatch`].
    pub fn start_bindings(self) -> DispatcherHandle {
        let mut router = Router::new();
        let mut states = Vec::with_capacity(self.bindings.len());
        let mut workers = Vec::with_capacity(self.bindings.len());

        for binding in self.bindings {
            let (tx, rx) = mpsc::unbounded_channel();
            let state = StateCell::default();
            router.add(&binding.name, binding.patterns.clone(), tx);
            states.push((binding.name.clone(), state.clone()));
            workers.push(tokio::spawn(run_binding(
                binding,
                rx,
                Arc::clone(&self.signal),
                state,
            )));
        }

        DispatcherHandle {
            router: Arc::new(router),
            states,
            workers,
            watcher: None,
        }
    }
}

/// Running dispatcher. Dropping it leaves the tasks running; call [`stop`].
///
/// [`stop`]: DispatcherHandle::stop
pub struct DispatcherHandle {
    router: Arc<Router>,
    states: Vec<(String, StateCell)>,
    workers: Vec<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Route `paths` as if they had changed on disk, bypassing the debouncer.
    ///
    /// Returns the number of bindings triggered.
    pub fn dispatch(&self, paths: &[PathBuf]) -> usize {
        self.router.dispatch(paths)
    }

    pub fn state(&self, name: &str) -> Option<BindingState> {
        self.states
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, state)| state.get())
    }

    /// Stop watching and abort the binding tasks.
    ///
    /// Adapters already on the blocking pool run to completion.
    pub fn stop(self) {
        if let Some(watcher) = self.watcher {
            watcher.abort();
        }
        for worker in self.workers {
            worker.abort();
        }
        debug!("watch"; "dispatcher stopped");
    }
}

async fn run_binding(
    binding: WatchBinding,
    mut rx: mpsc::UnboundedReceiver<Trigger>,
    signal: Arc<dyn ReloadSignal>,
    state: StateCell,
) {
    while let Some(mut changed) = rx.recv().await {
        drain(&mut rx, &mut changed);

        let outcomes = loop {
            state.set(BindingState::Dispatching);
            debug!("watch"; "{}: {} changed", binding.name, changed.len());
            let outcomes = runner::series(&binding.tasks).await;

            let skipped: Vec<_> = binding
                .tasks
                .iter()
                .zip(&outcomes)
                .filter(|(_, outcome)| **outcome == TaskOutcome::Skipped)
                .map(|(task, _)| task)
                .collect();
            if !skipped.is_empty() {
                debug!("watch"; "{}: waiting for {} in progress", binding.name, skipped.len());
                for task in skipped {
                    task.wait_idle().await;
                }
                drain(&mut rx, &mut changed);
                continue;
            }

            if !drain(&mut rx, &mut changed) {
                break outcomes;
            }
            debug!("watch"; "{}: changed again while rebuilding", binding.name);
        };

        report(&binding.name, &changed, &outcomes);

        state.set(BindingState::Notifying);
        signal.notify(&binding.name);
        state.set(BindingState::Idle);
    }
}

/// Move every queued trigger into `changed`; true if there was any.
fn drain(rx: &mut mpsc::UnboundedReceiver<Trigger>, changed: &mut Trigger) -> bool {
    let mut any = false;
    while let Ok(more) = rx.try_recv() {
        changed.extend(more);
        any = true;
    }
    if any {
        changed.sort();
        changed.dedup();
    }
    any
}

fn report(name: &str, changed: &[PathBuf], outcomes: &[TaskOutcome]) {
    let files = describe(changed);
    let pending = |o: &TaskOutcome| matches!(o, TaskOutcome::TimedOut | TaskOutcome::Skipped);
    if !runner::any_failed(outcomes) && !outcomes.iter().any(pending) {
        logger::status_success(&format!("{name}: rebuilt ({files})"));
        return;
    }
    if outcomes.iter().filter(|o| o.is_failure()).all(pending) {
        logger::status_warning(&format!("{name}: still rebuilding ({files})"));
        return;
    }

    let detail: Vec<String> = outcomes
        .iter()
        .filter(|o| o.is_failure())
        .flat_map(|outcome| match outcome {
            TaskOutcome::Completed(report) => report
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.path.display(), e.message))
                .collect(),
            other => vec![other.to_string()],
        })
        .collect();
    logger::status_error(&format!("{name}: rebuild failed ({files})"), &detail.join("\n"));
}

fn describe(changed: &[PathBuf]) -> String {
    let names: Vec<String> = changed
        .iter()
        .take(3)
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    match changed.len() {
        0..=3 => names.join(", "),
        n => format!("{} and {} more", names.join(", "), n - 3),
    }
}
