pub mod asset;
pub mod module_info;
