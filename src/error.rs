use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocalizeError>;

/// Failure of a single scalar transform call.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// The translation service answered with a non-success status.
    #[error("couldn't translate due to an error: HTTP {status}: {body}")]
    TranslationService { status: u16, body: String },

    /// The request never produced a response.
    #[error("translation request failed: {0}")]
    Http(String),

    #[error("invalid translation response: {0}")]
    InvalidResponse(String),

    /// The transform refused this particular input.
    #[error("transform rejected input: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum LocalizeError {
    #[error("module info not found at {path}, it's not a valid mod directory")]
    InvalidMod { path: PathBuf },

    #[error("failed to decode asset {path}: {reason}")]
    AssetDecode { path: PathBuf, reason: String },

    #[error("failed to encode asset: {0}")]
    AssetEncode(String),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl LocalizeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LocalizeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// `e` followed by each of its sources, separated by `": "`.
pub fn error_chain(e: &dyn std::error::Error) -> String {
    let mut detail = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
