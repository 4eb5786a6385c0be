use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::registry::SourceSet;
use crate::runner::Task;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Patterns whose changes run `tasks` in series, then one reload.
#[derive(Debug)]
pub struct WatchBinding {
    pub name: String,
    pub patterns: SourceSet,
    pub tasks: Vec<Arc<Task>>,
}

impl WatchBinding {
    pub fn new(name: impl Into<String>, patterns: SourceSet, tasks: Vec<Arc<Task>>) -> Self {
        Self {
            name: name.into(),
            patterns,
            tasks,
        }
    }
}

/// Observable state of a running binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BindingState {
    Idle = 0,
    Dispatching = 1,
    Notifying = 2,
}

/// Shared cell holding a [`BindingState`].
#[derive(Debug, Clone, Default)]
pub(super) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(super) fn get(&self) -> BindingState {
        match self.0.load(Ordering::Acquire) {
            1 => BindingState::Dispatching,
            2 => BindingState::Notifying,
            _ => BindingState::Idle,
        }
    }

    pub(super) fn set(&self, state: BindingState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// A batch of changed paths sent to one binding.
pub(super) type Trigger = Vec<PathBuf>;
