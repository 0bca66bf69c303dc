use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{LocalizeError, Result};
use crate::model::diagnostic::TracingSink;
use crate::model::layout::{ModDirectory, ModLayout};
use crate::parsers::asset::JsonAssetCodec;
use crate::services::batch::{BatchOrchestrator, BatchReport};
use crate::services::deepl::{DeeplClient, DeeplConfig, TranslationService};
use crate::services::pipeline::{self, ModOutcome, ModPipeline};
use crate::services::progress::{self, Progress};
use crate::services::transform::ScalarTransform;
use crate::services::translation_memory::cache::TranslationCache;
use crate::services::translator::CachedTranslator;
use crate::services::translit::Transliterator;

mod command;
pub use command::{Cli, Command, TransformArgs};

/// How transform instances are produced for a run.
enum TransformSource {
    Translit,
    Translate {
        service: Arc<dyn TranslationService>,
        shared_cache: Option<TranslationCache>,
    },
}

impl TransformSource {
    fn resolve(args: TransformArgs, share_cache: bool) -> Result<Self> {
        if !args.translate {
            return Ok(TransformSource::Translit);
        }

        let client = DeeplClient::new(DeeplConfig::from_env()?)?;
        Ok(TransformSource::Translate {
            service: Arc::new(client),
            shared_cache: share_cache.then(TranslationCache::new),
        })
    }

    /// A new transform; translators get a fresh cache unless one is shared.
    fn instance(&self) -> Box<dyn ScalarTransform + Send> {
        match self {
            TransformSource::Translit => Box::new(Transliterator),
            TransformSource::Translate {
                service,
                shared_cache,
            } => {
                let cache = shared_cache.clone().unwrap_or_default();
                Box::new(CachedTranslator::new(Arc::clone(service), cache))
            }
        }
    }
}

fn load_layout(path: Option<&Path>) -> Result<ModLayout> {
    match path {
        Some(p) => ModLayout::load(p),
        None => Ok(ModLayout::default()),
    }
}

fn build_pipeline(layout: ModLayout) -> ModPipeline {
    ModPipeline::new(layout, Arc::new(JsonAssetCodec), Arc::new(TracingSink))
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}").map_err(|e| LocalizeError::io("<stdout>", e))
}

fn transl_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(".transl");
    PathBuf::from(name)
}

pub fn handle(cli: Cli) -> Result<()> {
    let layout = load_layout(cli.layout.as_deref())?;

    match cli.command {
        Command::Show { file } => {
            let shown = build_pipeline(layout).show_asset(&file)?;
            print_stdout(&shown)
        }

        Command::TranslDat {
            transform,
            stdout,
            file,
        } => {
            let source = TransformSource::resolve(transform, false)?;
            let pipeline = build_pipeline(layout);
            let mut f = source.instance();
            let bar = progress::terminal_bar("translating");

            if stdout {
                let tree = pipeline.translate_asset(&file, f.as_mut(), Some(&bar as &dyn Progress))?;
                print_stdout(&pipeline::render(&tree)?)
            } else {
                let target = transl_path(&file);
                pipeline.translate_asset_file(&file, &target, f.as_mut(), Some(&bar as &dyn Progress))?;
                info!(target = %target.display(), "asset written");
                Ok(())
            }
        }

        Command::TranslMod {
            transform,
            rewrite,
            folder,
        } => {
            let source = TransformSource::resolve(transform, false)?;
            let pipeline = build_pipeline(layout);
            let mut f = source.instance();
            let bar = progress::terminal_bar("translating");

            let dir = ModDirectory::new(folder);
            match pipeline.process_mod(&dir, f.as_mut(), rewrite, Some(&bar as &dyn Progress))? {
                ModOutcome::Skipped => info!(mod_name = %dir.qualified_name(), "mod skipped"),
                ModOutcome::Localized { .. } => {}
            }
            Ok(())
        }

        Command::TranslAllMods {
            transform,
            rewrite,
            jobs,
            share_cache,
            report: report_path,
            folder,
        } => {
            let source = TransformSource::resolve(transform, share_cache)?;
            let mut batch = BatchOrchestrator::new(build_pipeline(layout)).with_rewrite(rewrite);
            if let Some(n) = jobs {
                batch = batch.with_workers(n);
            }

            let bar = progress::terminal_bar("mods");
            let report = batch.process_all(&folder, &|| source.instance(), &bar)?;

            if report.has_failures() {
                warn!(
                    failed = report.failed.len(),
                    total = report.total,
                    "some mods could not be processed"
                );
                for failure in &report.failed {
                    let line = format!("{}: {}", failure.mod_name, failure.detail);
                    let _ = writeln!(io::stderr(), "ERROR {line}");
                }
            }

            match report_path {
                Some(path) => write_report(&path, &report),
                None => Ok(()),
            }
        }
    }
}

fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| LocalizeError::Config(format!("failed to serialize report: {e}")))?;
    fs::write(path, json).map_err(|e| LocalizeError::io(path, e))
}
