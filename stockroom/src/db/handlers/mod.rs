pub mod assets;
pub mod file_storage;
pub mod memory;

pub use assets::{AssetFilter, AssetRepository, PgAssets};
pub use file_storage::{FileStorage, LocalFileStorage, MemoryFileStorage, PostgresFileStorage};
pub use memory::MemoryAssets;
