pub mod memory;

#[cfg(feature = "parquet")]
pub mod parquet;

pub use memory::{FixtureBundle, MemorySource};

#[cfg(feature = "parquet")]
pub use self::parquet::ParquetSource;
