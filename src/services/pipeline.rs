use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LocalizeError, Result};
use crate::model::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, ModScopedSink};
use crate::model::layout::{ModDirectory, ModLayout};
use crate::model::value::NestedValue;
use crate::parsers::asset::{self, AssetCodec};
use crate::services::progress::{Progress, Tracked};
use crate::services::transform::{self, ScalarTransform};
use crate::services::{backup, metadata};

/// What [`ModPipeline::process_mod`] did to a mod.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModOutcome {
    /// The target asset already existed and rewriting was off.
    Skipped,
    /// Metadata rewritten; `asset_written` tells whether a source asset existed.
    Localized { asset_written: bool },
}

/// Localizes one mod at a time: target asset plus module info.
pub struct ModPipeline {
    layout: ModLayout,
    codec: Arc<dyn AssetCodec>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ModPipeline {
    pub fn new(layout: ModLayout, codec: Arc<dyn AssetCodec>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            layout,
            codec,
            sink,
        }
    }

    pub fn layout(&self) -> &ModLayout {
        &self.layout
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    pub fn read_asset(&self, path: &Path) -> Result<NestedValue> {
        let bytes = fs::read(path).map_err(|e| LocalizeError::io(path, e))?;
        self.codec
            .decode(&bytes)
            .map_err(|reason| LocalizeError::AssetDecode {
                path: path.to_path_buf(),
                reason,
            })
    }

    pub fn encode_asset(&self, tree: &NestedValue) -> Result<Vec<u8>> {
        self.codec
            .encode(tree, self.layout.format)
            .map_err(LocalizeError::AssetEncode)
    }

    /// Pretty JSON rendering of an asset, for display.
    pub fn show_asset(&self, path: &Path) -> Result<String> {
        let tree = self.read_asset(path)?;
        render(&tree)
    }

    /// Transforms every scalar of `tree`, reporting one tick per scalar.
    pub fn translate_tree(
        &self,
        tree: &NestedValue,
        f: &mut dyn ScalarTransform,
        progress: Option<&dyn Progress>,
        sink: &dyn DiagnosticSink,
    ) -> Result<NestedValue> {
        let Some(progress) = progress else {
            return Ok(transform::apply(tree, f, sink)?);
        };

        progress.set_total(transform::count_scalars(tree) as u64);
        let mut tracked = Tracked { inner: f, progress };
        let result = transform::apply(tree, &mut tracked, sink);
        progress.finish();

        Ok(result?)
    }

    /// Decodes `source`, transforms it and returns the new tree.
    pub fn translate_asset(
        &self,
        source: &Path,
        f: &mut dyn ScalarTransform,
        progress: Option<&dyn Progress>,
    ) -> Result<NestedValue> {
        let tree = self.read_asset(source)?;
        self.translate_tree(&tree, f, progress, self.sink())
    }

    /// Decodes `source`, transforms it and writes the result to `target`.
    pub fn translate_asset_file(
        &self,
        source: &Path,
        target: &Path,
        f: &mut dyn ScalarTransform,
        progress: Option<&dyn Progress>,
    ) -> Result<()> {
        self.write_translated(source, target, f, progress, self.sink())
    }

    fn write_translated(
        &self,
        source: &Path,
        target: &Path,
        f: &mut dyn ScalarTransform,
        progress: Option<&dyn Progress>,
        sink: &dyn DiagnosticSink,
    ) -> Result<()> {
        let tree = self.read_asset(source)?;
        let translated = self.translate_tree(&tree, f, progress, sink)?;
        let bytes = self.encode_asset(&translated)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| LocalizeError::io(parent, e))?;
        }
        fs::write(target, bytes).map_err(|e| LocalizeError::io(target, e))?;

        debug!(source = %source.display(), target = %target.display(), "asset written");
        Ok(())
    }

    /// Localizes one mod directory.
    ///
    /// An existing target asset makes the whole mod a skip unless `rewrite`
    /// is set, in which case it is backed up first. The module info is always
    /// backed up before it is rewritten. Fails with
    /// [`LocalizeError::InvalidMod`] when the module info is missing.
    pub fn process_mod(
        &self,
        dir: &ModDirectory,
        f: &mut dyn ScalarTransform,
        rewrite: bool,
        progress: Option<&dyn Progress>,
    ) -> Result<ModOutcome> {
        let sink = ModScopedSink {
            inner: self.sink(),
            mod_name: dir.qualified_name(),
        };

        let target = dir.target_asset(&self.layout);
        if target.exists() {
            if !rewrite {
                sink.emit(
                    Diagnostic::new(
                        DiagnosticKind::TargetAlreadyExists,
                        "target language asset found, skipping",
                    )
                    .with_path(&target),
                );
                return Ok(ModOutcome::Skipped);
            }

            sink.emit(
                Diagnostic::new(
                    DiagnosticKind::TargetAlreadyExists,
                    "target language asset found, it will be backed up and replaced",
                )
                .with_path(&target),
            );
            backup::create_backup(&target)?;
        }

        let source = dir.source_asset(&self.layout);
        let asset_written = source.exists();
        if asset_written {
            self.write_translated(&source, &target, f, progress, &sink)?;
        }

        let module_info = dir.metadata_file(&self.layout);
        if !module_info.exists() {
            return Err(LocalizeError::InvalidMod {
                path: dir.path().to_path_buf(),
            });
        }

        backup::create_backup(&module_info)?;
        metadata::rewrite_file(&module_info, &dir.category(), f, rewrite, &sink)?;

        info!(mod_name = %dir.qualified_name(), asset_written, "mod localized");
        Ok(ModOutcome::Localized { asset_written })
    }
}

/// Pretty JSON with non-ASCII text kept readable.
pub fn render(tree: &NestedValue) -> Result<String> {
    serde_json::to_string_pretty(&asset::to_json(tree))
        .map_err(|e| LocalizeError::AssetEncode(e.to_string()))
}
