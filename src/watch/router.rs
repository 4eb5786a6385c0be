use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use super::types::Trigger;
use crate::registry::SourceSet;
use crate::{debug, log};

struct Route {
    name: String,
    patterns: SourceSet,
    tx: UnboundedSender<Trigger>,
}

/// Maps changed paths to the one binding whose patterns match them.
pub(super) struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub(super) fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub(super) fn add(&mut self, name: &str, patterns: SourceSet, tx: UnboundedSender<Trigger>) {
        self.routes.push(Route {
            name: name.to_owned(),
            patterns,
            tx,
        });
    }

    /// Every distinct glob base across all routes.
    pub(super) fn bases(&self) -> Vec<PathBuf> {
        self.routes.iter().flat_map(|r| r.patterns.bases()).collect()
    }

    /// Send each path to its binding; returns how many bindings were triggered.
    ///
    /// Paths matching no binding are dropped, paths matching several are
    /// reported and dropped.
    pub(super) fn dispatch(&self, paths: &[PathBuf]) -> usize {
        let mut batches: Vec<Trigger> = vec![Vec::new(); self.routes.len()];

        for path in paths {
            let hits: Vec<usize> = self
                .routes
                .iter()
                .enumerate()
                .filter(|(_, route)| route.patterns.matches(path))
                .map(|(index, _)| index)
                .collect();

            match hits.as_slice() {
                [] => debug!("watch"; "no binding for {}", path.display()),
                [index] => batches[*index].push(path.clone()),
                many => {
                    let names: Vec<&str> = many.iter().map(|&i| self.routes[i].name.as_str()).collect();
                    log!("watch"; "{} matches {}; not dispatched", path.display(), names.join(", "));
                }
            }
        }

        let mut triggered = 0;
        for (route, batch) in self.routes.iter().zip(batches) {
            if batch.is_empty() {
                continue;
            }
            if route.tx.send(batch).is_ok() {
                triggered += 1;
            } else {
                debug!("watch"; "{} is stopped", route.name);
            }
        }
        triggered
    }
}
