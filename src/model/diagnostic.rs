use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

/// Non-fatal conditions reported while processing mods.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    LowConfidenceEncoding,
    TargetAlreadyExists,
    SequenceElementTransform,
    NoModsFound,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,

    #[serde(default)]
    pub mod_name: Option<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            mod_name: None,
            key: None,
            path: None,
        }
    }

    pub fn with_mod(mut self, mod_name: impl Into<String>) -> Self {
        self.mod_name = Some(mod_name.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Receives advisories. Shared between batch workers, so it must be `Sync`.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Logs every advisory as a `warn!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: Diagnostic) {
        warn!(
            kind = ?d.kind,
            mod_name = d.mod_name.as_deref().unwrap_or(""),
            key = d.key.as_deref().unwrap_or(""),
            path = %d.path.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
            "{}",
            d.message
        );
    }
}

/// Keeps advisories in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct CollectingSink {
    items: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        match self.items.lock() {
            Ok(mut items) => std::mem::take(&mut *items),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        match self.items.lock() {
            Ok(items) => items.iter().filter(|d| d.kind == kind).count(),
            Err(poisoned) => poisoned.into_inner().iter().filter(|d| d.kind == kind).count(),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match self.items.lock() {
            Ok(mut items) => items.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

/// Fills in the mod name on everything passing through.
pub(crate) struct ModScopedSink<'a> {
    pub inner: &'a dyn DiagnosticSink,
    pub mod_name: String,
}

impl DiagnosticSink for ModScopedSink<'_> {
    fn emit(&self, mut diagnostic: Diagnostic) {
        if diagnostic.mod_name.is_none() {
            diagnostic.mod_name = Some(self.mod_name.clone());
        }
        self.inner.emit(diagnostic);
    }
}
