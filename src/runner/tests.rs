use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;

use super::test_support::{Behavior, FakeTransform, task};
use super::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn new_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

#[tokio::test]
async fn test_series_runs_in_order() {
    let log = new_log();
    let (a, _) = task(FakeTransform::new("a", &log).delay(Duration::from_millis(40)), TIMEOUT);
    let (b, _) = task(FakeTransform::new("b", &log).delay(Duration::from_millis(10)), TIMEOUT);
    let (c, _) = task(FakeTransform::new("c", &log), TIMEOUT);

    let outcomes = series(&[a, b, c]).await;
    assert_eq!(outcomes.len(), 3);
    assert!(!any_failed(&outcomes));
    assert_eq!(
        *log.lock(),
        vec!["a:start", "a:end", "b:start", "b:end", "c:start", "c:end"]
    );
}

#[tokio::test]
async fn test_series_continues_after_failures() {
    let log = new_log();
    let (a, _) = task(FakeTransform::new("a", &log).behavior(Behavior::Error), TIMEOUT);
    let (b, _) = task(FakeTransform::new("b", &log).behavior(Behavior::Panic), TIMEOUT);
    let (c, _) = task(FakeTransform::new("c", &log).behavior(Behavior::FileError), TIMEOUT);
    let (d, d_runs) = task(FakeTransform::new("d", &log), TIMEOUT);

    let outcomes = series(&[a.clone(), b.clone(), c.clone(), d.clone()]).await;
    assert_eq!(outcomes[0], TaskOutcome::Failed("cannot create output".to_owned()));
    assert!(matches!(&outcomes[1], TaskOutcome::Failed(m) if m.contains("adapter bug")));
    assert!(matches!(&outcomes[2], TaskOutcome::Completed(r) if r.errors.len() == 1));
    assert!(matches!(&outcomes[3], TaskOutcome::Completed(r) if r.is_ok()));
    assert_eq!(d_runs.load(Ordering::SeqCst), 1);

    assert_eq!(a.state(), TaskState::Failed);
    assert_eq!(b.state(), TaskState::Failed);
    assert_eq!(c.state(), TaskState::Failed);
    assert_eq!(d.state(), TaskState::Idle);
    assert!(any_failed(&outcomes));
}

#[tokio::test]
async fn test_task_is_reusable() {
    let log = new_log();
    let (a, runs) = task(FakeTransform::new("a", &log), TIMEOUT);
    for _ in 0..3 {
        assert!(matches!(a.run().await, TaskOutcome::Completed(_)));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert_eq!(a.state(), TaskState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timeout_leaves_task_still_running() {
    let log = new_log();
    let slow = FakeTransform::new("slow", &log).delay(Duration::from_millis(300));
    let (slow, runs) = task(slow, Duration::from_millis(50));
    let (next, _) = task(FakeTransform::new("next", &log), TIMEOUT);

    let outcomes = series(&[slow.clone(), next]).await;
    assert_eq!(outcomes[0], TaskOutcome::TimedOut);
    assert!(matches!(outcomes[1], TaskOutcome::Completed(_)));
    assert_eq!(slow.state(), TaskState::StillRunning);

    // next ran while slow was still going
    assert_eq!(log.lock()[..3], ["slow:start", "next:start", "next:end"]);

    assert_eq!(slow.run().await, TaskOutcome::Skipped);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(slow.state(), TaskState::Idle);
    assert!(log.lock().contains(&"slow:end".to_owned()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_idle_after_timeout() {
    let log = new_log();
    let slow = FakeTransform::new("slow", &log).delay(Duration::from_millis(200));
    let (slow, runs) = task(slow, Duration::from_millis(20));

    assert_eq!(slow.run().await, TaskOutcome::TimedOut);
    tokio::time::timeout(TIMEOUT, slow.wait_idle()).await.unwrap();
    assert_eq!(slow.state(), TaskState::Idle);
    assert!(log.lock().contains(&"slow:end".to_owned()));

    assert!(matches!(slow.run().await, TaskOutcome::Completed(_)));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_wait_idle_returns_when_idle() {
    let log = new_log();
    let (a, _) = task(FakeTransform::new("a", &log), TIMEOUT);
    tokio::time::timeout(TIMEOUT, a.wait_idle()).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_parallel_overlaps_and_keeps_order() {
    let log = new_log();
    let (a, _) = task(FakeTransform::new("a", &log).delay(Duration::from_millis(100)), TIMEOUT);
    let (b, _) = task(FakeTransform::new("b", &log).behavior(Behavior::Error), TIMEOUT);

    let outcomes = parallel(&[a, b]).await;
    assert!(matches!(outcomes[0], TaskOutcome::Completed(_)));
    assert!(matches!(outcomes[1], TaskOutcome::Failed(_)));

    let log = log.lock();
    let a_end = log.iter().position(|e| e == "a:end").unwrap();
    let b_start = log.iter().position(|e| e == "b:start").unwrap();
    assert!(b_start < a_end);
}

#[tokio::test]
async fn test_detach_returns_handle() {
    let log = new_log();
    let (a, runs) = task(FakeTransform::new("a", &log).delay(Duration::from_millis(20)), TIMEOUT);
    let handle = detach(a);
    let outcome = handle.await.unwrap();
    assert!(matches!(outcome, TaskOutcome::Completed(_)));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_outcome_display() {
    assert_eq!(TaskOutcome::TimedOut.to_string(), "timed out, still running");
    assert_eq!(TaskOutcome::Failed("boom".into()).to_string(), "failed: boom");
    assert!(!TaskOutcome::Skipped.is_failure());
}
