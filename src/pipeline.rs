//! Entry points: the `html` and `template` pipelines.
//!
//! Both build the same five categories in series, markup first:
//!
//! ```text
//! markup ─► styles ─► fonts ─► scripts ─► images      (initial build)
//!                         │
//!                         ▼
//!       ReloadNotifier (dist) + WatchDispatcher, until Ctrl+C
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::config::KilnConfig;
use crate::core::{self, AssetCategory};
use crate::registry::PathRegistry;
use crate::reload::{ReloadNotifier, ReloadSignal};
use crate::runner::{self, Task, TaskOutcome};
use crate::transform::adapter_for;
use crate::watch::{WatchBinding, WatchDispatcher};
use crate::{debug, log};

/// Which markup flavor a pipeline builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Plain HTML with `@@include` (default)
    Html,
    /// minijinja templates
    Template,
}

impl Pipeline {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Template => "template",
        }
    }

    pub const fn markup(self) -> AssetCategory {
        match self {
            Self::Html => AssetCategory::PlainMarkup,
            Self::Template => AssetCategory::TemplateMarkup,
        }
    }

    /// Categories in initial build order.
    pub const fn categories(self) -> [AssetCategory; 5] {
        [
            self.markup(),
            AssetCategory::Styles,
            AssetCategory::Fonts,
            AssetCategory::Scripts,
            AssetCategory::Images,
        ]
    }
}

/// Registry plus one task per pipeline category, built once at startup.
pub struct Prepared {
    pipeline: Pipeline,
    registry: PathRegistry,
    tasks: Vec<Arc<Task>>,
}

impl Prepared {
    pub fn new(pipeline: Pipeline, config: &KilnConfig) -> Result<Self> {
        let registry = PathRegistry::new(&config.root, &config.paths)?;
        let timeout = config.build.timeout();

        let tasks = pipeline
            .categories()
            .into_iter()
            .map(|category| {
                let transform = adapter_for(category, config)
                    .with_context(|| format!("failed to set up {category}"))?;
                Ok(Arc::new(Task::for_entry(registry.entry(category), transform, timeout)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            pipeline,
            registry,
            tasks,
        })
    }

    pub fn tasks(&self) -> &[Arc<Task>] {
        &self.tasks
    }

    /// Directory served in watch mode: the markup destination.
    pub fn output_root(&self) -> &Path {
        &self.registry.entry(self.pipeline.markup()).dest
    }

    /// Every task in series, logging each outcome.
    pub async fn run_initial(&self) -> Vec<TaskOutcome> {
        let start = Instant::now();
        let outcomes = runner::series(&self.tasks).await;
        for (task, outcome) in self.tasks.iter().zip(&outcomes) {
            debug!("build"; "{}: {}", task.name(), outcome);
        }

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        if failed == 0 {
            log!("build"; "{} pipeline built in {:.2}s", self.pipeline.name(), start.elapsed().as_secs_f32());
        } else {
            log!("build"; "{} pipeline built with {} failed tasks", self.pipeline.name(), failed);
        }
        outcomes
    }

    /// One binding per category of this pipeline, watching its sources and
    /// partials. The other pipeline's markup is not watched.
    pub fn bindings(&self) -> Vec<WatchBinding> {
        self.tasks
            .iter()
            .map(|task| {
                let entry = self.registry.entry(task.category());
                WatchBinding::new(task.category().name(), entry.watch_set(), vec![Arc::clone(task)])
            })
            .collect()
    }
}

/// `kiln build`: initial build only; fails if any task failed.
pub async fn build(pipeline: Pipeline, config: &KilnConfig) -> Result<()> {
    let prepared = Prepared::new(pipeline, config)?;
    let outcomes = prepared.run_initial().await;
    if runner::any_failed(&outcomes) {
        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        bail!("{failed} of {} tasks failed", outcomes.len());
    }
    Ok(())
}

/// `kiln html` / `kiln template`: build, serve, rebuild on change until Ctrl+C.
pub async fn serve(pipeline: Pipeline, config: &KilnConfig) -> Result<()> {
    let prepared = Prepared::new(pipeline, config)?;
    prepared.run_initial().await;

    let notifier = Arc::new(ReloadNotifier::start(prepared.output_root(), &config.serve)?);
    core::register_server(notifier.server());

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded(1);
    core::register_shutdown(shutdown_tx);

    let signal: Arc<dyn ReloadSignal> = Arc::clone(&notifier) as Arc<dyn ReloadSignal>;
    let dispatcher = WatchDispatcher::new(prepared.bindings(), signal).start()?;

    tokio::task::spawn_blocking(move || shutdown_rx.recv())
        .await
        .context("shutdown listener failed")?
        .ok();

    dispatcher.stop();
    notifier.stop();
    Ok(())
}
