use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LocalizeError, Result};

fn default_cfg_dir() -> String {
    "CFG".to_string()
}

fn default_source_lang() -> String {
    "Rus".to_string()
}

fn default_target_lang() -> String {
    "Eng".to_string()
}

fn default_asset_file() -> String {
    "Lang.dat".to_string()
}

fn default_metadata_file() -> String {
    "ModuleInfo.txt".to_string()
}

/// Serialization variant used for every rewritten asset.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssetFormat {
    #[default]
    Pretty,
    Compact,
}

/// Where things live inside a mod directory.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModLayout {
    #[serde(default = "default_cfg_dir")]
    pub cfg_dir: String,

    #[serde(default = "default_source_lang", alias = "source_language")]
    pub source_lang: String,

    #[serde(default = "default_target_lang", alias = "target_language")]
    pub target_lang: String,

    #[serde(default = "default_asset_file")]
    pub asset_file: String,

    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    #[serde(default)]
    pub format: AssetFormat,
}

impl Default for ModLayout {
    fn default() -> Self {
        Self {
            cfg_dir: default_cfg_dir(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            asset_file: default_asset_file(),
            metadata_file: default_metadata_file(),
            format: AssetFormat::default(),
        }
    }
}

impl ModLayout {
    /// Reads a layout from a JSON file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| LocalizeError::io(path, e))?;
        serde_json::from_str(&data)
            .map_err(|e| LocalizeError::Config(format!("invalid layout {}: {e}", path.display())))
    }
}

/// A `<root>/<category>/<mod>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDirectory {
    path: PathBuf,
}

impl ModDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    /// Name of the grouping directory one level above the mod.
    pub fn category(&self) -> String {
        self.path.parent().map(file_name).unwrap_or_default()
    }

    /// `category/mod`, used to identify a mod in batch reports.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.category(), self.name())
    }

    pub fn source_asset(&self, layout: &ModLayout) -> PathBuf {
        self.path
            .join(&layout.cfg_dir)
            .join(&layout.source_lang)
            .join(&layout.asset_file)
    }

    pub fn target_asset(&self, layout: &ModLayout) -> PathBuf {
        self.path
            .join(&layout.cfg_dir)
            .join(&layout.target_lang)
            .join(&layout.asset_file)
    }

    pub fn metadata_file(&self, layout: &ModLayout) -> PathBuf {
        self.path.join(&layout.metadata_file)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
