pub mod backup;
pub mod batch;
pub mod deepl;
pub mod encoding;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod transform;
pub mod translation_memory;
pub mod translator;
pub mod translit;

