//! Filesystem side of the dispatcher.
//!
//! ```text
//! notify callback ─► std mpsc ─► bridge thread ─► tokio mpsc ─► Debouncer ─► Router
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecommendedWatcher;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::debouncer::Debouncer;
use super::router::Router;
use super::watch_roots::{WatchRoots, outermost};
use crate::{debug, log};

/// How often missing roots are re-checked while nothing is pending.
const IDLE_TICK: Duration = Duration::from_secs(1);

pub(super) struct FsWatcher {
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    router: Arc<Router>,
}

impl FsWatcher {
    /// Attach to `roots` immediately so changes made before [`run`] are buffered.
    ///
    /// [`run`]: FsWatcher::run
    pub(super) fn new(roots: Vec<PathBuf>, router: Arc<Router>) -> Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .context("failed to create file watcher")?;

        let mut roots = WatchRoots::new(outermost(roots));
        roots
            .attach_existing(&mut watcher)
            .context("failed to watch source directories")?;
        debug!("watch"; "watching {} directories", roots.attached_count());

        Ok(Self {
            notify_rx,
            watcher,
            roots,
            router,
        })
    }

    pub(super) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let Self {
            notify_rx,
            mut watcher,
            mut roots,
            router,
        } = self;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration(IDLE_TICK)) => {
                    roots.maintain(&mut watcher);
                    if let Some(paths) = debouncer.take_if_ready() {
                        router.dispatch(&paths);
                    }
                }
            }
        }
    }
}
