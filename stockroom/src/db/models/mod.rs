pub mod assets;
pub mod file_storage;
