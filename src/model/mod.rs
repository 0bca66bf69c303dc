pub mod diagnostic;
pub mod layout;
pub mod metadata;
pub mod value;
