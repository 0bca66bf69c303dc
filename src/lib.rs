//! Localizes game mods: rewrites each mod's language asset tree and its
//! module info file so the mod ships an English variant.

pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;

pub use error::{LocalizeError, Result, TransformError};
pub use model::diagnostic::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use model::layout::{AssetFormat, ModDirectory, ModLayout};
pub use model::metadata::MetadataRecord;
pub use model::value::{Mapping, NestedValue};
pub use parsers::asset::{AssetCodec, JsonAssetCodec};
pub use services::batch::{BatchOrchestrator, BatchReport, ModFailure};
pub use services::pipeline::{ModOutcome, ModPipeline};
pub use services::transform::{apply, count_scalars, ScalarTransform};
