pub mod cache;
pub mod hash;
