//! Runs the mod pipeline over every mod under a root directory.
//!
//! Mods are discovered as `<root>/<category>/<mod>` directories. Each one
//! becomes a task carrying its own transform instance; tasks run on a
//! fixed-size rayon pool and each sends one result message back to the
//! calling thread. A failing or panicking mod is recorded and never stops the
//! batch.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread;

use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{error_chain, LocalizeError, Result};
use crate::model::diagnostic::{Diagnostic, DiagnosticKind};
use crate::model::layout::ModDirectory;
use crate::services::pipeline::{ModOutcome, ModPipeline};
use crate::services::progress::Progress;
use crate::services::transform::ScalarTransform;

/// Creates the transform for one mod task.
pub type TransformFactory<'a> = dyn Fn() -> Box<dyn ScalarTransform + Send> + 'a;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ModFailure {
    pub mod_name: String,
    pub detail: String,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    pub localized: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<ModFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record(&mut self, result: TaskResult) {
        self.completed += 1;
        match result.outcome {
            Ok(ModOutcome::Skipped) => self.skipped.push(result.mod_name),
            Ok(ModOutcome::Localized { .. }) => self.localized.push(result.mod_name),
            Err(detail) => {
                error!(mod_name = %result.mod_name, "error while processing mod: {detail}");
                self.failed.push(ModFailure {
                    mod_name: result.mod_name,
                    detail,
                });
            }
        }
    }

    fn sort(&mut self) {
        self.localized.sort();
        self.skipped.sort();
        self.failed.sort_by(|a, b| a.mod_name.cmp(&b.mod_name));
    }
}

struct Task {
    dir: ModDirectory,
    transform: Box<dyn ScalarTransform + Send>,
}

struct TaskResult {
    mod_name: String,
    outcome: std::result::Result<ModOutcome, String>,
}

pub struct BatchOrchestrator {
    pipeline: ModPipeline,
    workers: usize,
    rewrite: bool,
}

impl BatchOrchestrator {
    /// Pool sized to the available hardware parallelism.
    pub fn new(pipeline: ModPipeline) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            pipeline,
            workers,
            rewrite: false,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_rewrite(mut self, rewrite: bool) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn pipeline(&self) -> &ModPipeline {
        &self.pipeline
    }

    /// Every directory exactly two levels below `root`, sorted by path.
    pub fn discover(root: &Path) -> Result<Vec<ModDirectory>> {
        let mut found = Vec::new();

        for category in sorted_subdirs(root)? {
            match sorted_subdirs(&category) {
                Ok(mods) => found.extend(mods.into_iter().map(ModDirectory::new)),
                Err(e) => warn!(category = %category.display(), error = %e, "skipping unreadable category"),
            }
        }

        Ok(found)
    }

    /// Localizes every mod under `root`.
    ///
    /// `factory` is called once per mod, on this thread, before the task is
    /// queued. `progress` ticks once per finished task.
    pub fn process_all(
        &self,
        root: &Path,
        factory: &TransformFactory<'_>,
        progress: &dyn Progress,
    ) -> Result<BatchReport> {
        let dirs = Self::discover(root)?;
        let mut report = BatchReport {
            total: dirs.len(),
            ..BatchReport::default()
        };

        if dirs.is_empty() {
            self.pipeline.sink().emit(
                Diagnostic::new(DiagnosticKind::NoModsFound, "no mod directories found")
                    .with_path(root),
            );
            return Ok(report);
        }

        let tasks: Vec<Task> = dirs
            .into_iter()
            .map(|dir| Task {
                dir,
                transform: factory(),
            })
            .collect();

        let workers = self.workers.min(report.total);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("modloc-worker-{i}"))
            .build()
            .map_err(|e| LocalizeError::Config(format!("failed to start worker pool: {e}")))?;

        info!(mods = report.total, workers, "processing mods");
        progress.set_total(report.total as u64);

        let (result_tx, result_rx) = mpsc::channel::<TaskResult>();
        pool.in_place_scope(|s| {
            for task in tasks {
                let tx = result_tx.clone();
                let pipeline = &self.pipeline;
                let rewrite = self.rewrite;
                s.spawn(move |_| run_task(pipeline, task, rewrite, &tx));
            }
            drop(result_tx);

            for result in result_rx {
                report.record(result);
                progress.advance();
            }
        });

        progress.finish();
        report.sort();

        info!(
            localized = report.localized.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch complete"
        );
        Ok(report)
    }
}

fn run_task(pipeline: &ModPipeline, mut task: Task, rewrite: bool, results: &Sender<TaskResult>) {
    let mod_name = task.dir.qualified_name();
    debug!(worker = ?rayon::current_thread_index(), mod_name = %mod_name, "processing");

    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        pipeline.process_mod(&task.dir, task.transform.as_mut(), rewrite, None)
    }));

    let outcome = match run {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(error_chain(&e)),
        Err(payload) => Err(format!("internal error: {}", panic_message(payload.as_ref()))),
    };

    // The receiver lives until every task of the scope has finished.
    let _ = results.send(TaskResult { mod_name, outcome });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| LocalizeError::io(dir, e))?;
    let mut out: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::model::diagnostic::CollectingSink;
    use crate::model::layout::ModLayout;
    use crate::parsers::asset::JsonAssetCodec;
    use crate::services::progress::NoProgress;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn orchestrator(sink: Arc<CollectingSink>) -> BatchOrchestrator {
        let pipeline = ModPipeline::new(ModLayout::default(), Arc::new(JsonAssetCodec), sink);
        BatchOrchestrator::new(pipeline).with_workers(2)
    }

    fn upper_factory() -> Box<dyn ScalarTransform + Send> {
        Box::new(|s: &str| Ok::<_, TransformError>(s.to_uppercase()))
    }

    #[test]
    fn discovery_is_two_levels_deep() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("B/ModB/CFG/Rus")).unwrap();
        fs::create_dir_all(root.path().join("A/ModA")).unwrap();
        fs::write(root.path().join("A/readme.txt"), "").unwrap();
        fs::write(root.path().join("loose.txt"), "").unwrap();

        let names: Vec<String> = BatchOrchestrator::discover(root.path())
            .unwrap()
            .iter()
            .map(|d| d.qualified_name())
            .collect();
        assert_eq!(names, vec!["A/ModA", "B/ModB"]);
    }

    #[test]
    fn empty_root_warns_and_completes() {
        let root = TempDir::new().unwrap();
        let sink = Arc::new(CollectingSink::new());

        let report = orchestrator(sink.clone())
            .process_all(root.path(), &upper_factory, &NoProgress)
            .unwrap();

        assert_eq!(report.total, 0);
        assert!(report.is_complete());
        assert_eq!(sink.count(DiagnosticKind::NoModsFound), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = TempDir::new().unwrap();
        let result = orchestrator(Arc::new(CollectingSink::new())).process_all(
            &root.path().join("absent"),
            &upper_factory,
            &NoProgress,
        );
        assert!(matches!(result, Err(LocalizeError::Io { .. })));
    }

    #[test]
    fn panicking_transform_is_reported_as_failure() {
        let root = TempDir::new().unwrap();
        let mod_dir = root.path().join("Cat/Boom");
        fs::create_dir_all(&mod_dir).unwrap();
        fs::write(mod_dir.join("ModuleInfo.txt"), "SmallDescription=x\r\n").unwrap();

        let factory = || -> Box<dyn ScalarTransform + Send> {
            Box::new(|_: &str| -> std::result::Result<String, TransformError> {
                panic!("transform exploded")
            })
        };
        let report = orchestrator(Arc::new(CollectingSink::new()))
            .process_all(root.path(), &factory, &NoProgress)
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].mod_name, "Cat/Boom");
        assert!(report.failed[0].detail.contains("transform exploded"));
    }

    #[test]
    fn more_mods_than_workers_all_complete() {
        let root = TempDir::new().unwrap();
        for name in ["M1", "M2", "M3", "M4", "M5"] {
            let dir = root.path().join("Cat").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("ModuleInfo.txt"), "Section=S\r\nSmallDescription=x\r\n").unwrap();
        }

        let batch = orchestrator(Arc::new(CollectingSink::new())).with_workers(2);
        let report = batch.process_all(root.path(), &upper_factory, &NoProgress).unwrap();

        assert!(report.is_complete());
        assert!(!report.has_failures());
        assert_eq!(
            report.localized,
            vec!["Cat/M1", "Cat/M2", "Cat/M3", "Cat/M4", "Cat/M5"]
        );
    }

    #[test]
    fn failure_detail_includes_sources() {
        let e = LocalizeError::Io {
            path: "x".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
        };
        assert_eq!(error_chain(&e), "I/O error on x: disk gone");
    }
}
