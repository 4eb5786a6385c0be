//! Task runner: composes [`Task`] invocations.
//!
//! - [`series`]: each task's outcome gates the start of the next
//! - [`parallel`]: all tasks start at once, outcomes collected in order
//! - [`detach`]: explicit fire-and-forget, returns the join handle
//!
//! Adapters run on tokio's blocking pool. A task that times out resolves as
//! [`TaskOutcome::TimedOut`] and the series moves on.

mod task;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

pub use task::{Task, TaskOutcome, TaskState};

use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};

/// Run `tasks` one after another.
pub async fn series(tasks: &[Arc<Task>]) -> Vec<TaskOutcome> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        outcomes.push(task.run().await);
    }
    outcomes
}

/// Run `tasks` concurrently; outcomes are returned in `tasks` order.
pub async fn parallel(tasks: &[Arc<Task>]) -> Vec<TaskOutcome> {
    let mut set = JoinSet::new();
    for (index, task) in tasks.iter().enumerate() {
        let task = Arc::clone(task);
        set.spawn(async move { (index, task.run().await) });
    }

    let mut outcomes: Vec<Option<TaskOutcome>> = vec![None; tasks.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => crate::log!("runner"; "task join failed: {}", e),
        }
    }
    outcomes
        .into_iter()
        .map(|o| o.unwrap_or_else(|| TaskOutcome::Failed("task aborted".to_owned())))
        .collect()
}

/// Start `task` without waiting for it.
pub fn detach(task: Arc<Task>) -> JoinHandle<TaskOutcome> {
    tokio::spawn(async move { task.run().await })
}

/// Whether any outcome counts as a failed build.
pub fn any_failed(outcomes: &[TaskOutcome]) -> bool {
    outcomes.iter().any(TaskOutcome::is_failure)
}
