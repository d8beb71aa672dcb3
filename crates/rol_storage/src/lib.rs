use async_trait::async_trait;
use rol_core::{DashboardConfig, DatasetSource, Error, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait SourceBackend: DatasetSource {
    fn get_error_message() -> &'static str;
    async fn open(config: &DashboardConfig) -> Result<Self>
    where
        Self: Sized;
}

/// Names accepted by [`create_source`].
pub const SOURCE_KINDS: &[&str] = &["parquet", "memory"];

/// Open the dataset backend named by `config.source`.
pub async fn create_source(config: &DashboardConfig) -> Result<Arc<dyn DatasetSource>> {
    let source: Arc<dyn DatasetSource> = match config.source.as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => Arc::new(open_backend::<ParquetSource>(config).await?),
        "memory" => Arc::new(open_backend::<MemorySource>(config).await?),
        other => {
            return Err(Error::InvalidInput(format!(
                "Unknown dataset source '{}'. Available: {}",
                other,
                SOURCE_KINDS.join(", ")
            )))
        }
    };
    info!("📂 Dataset source ready (using {})", source.name());
    Ok(source)
}

async fn open_backend<T: SourceBackend>(config: &DashboardConfig) -> Result<T> {
    T::open(config).await.map_err(|e| match e {
        Error::Storage(msg) => Error::Storage(format!("{} ({})", msg, T::get_error_message())),
        other => other,
    })
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_source, SourceBackend};
}
