pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::DashboardConfig;
pub use error::Error;
pub use storage::DatasetSource;
pub use types::{
    clean_narrative, unique_by_id, week_start, Article, Country, CountryDataset, CountrySummary,
    ImpactScore, Narrative, Pillar, PillarMembership, TextField,
};

pub type Result<T> = std::result::Result<T, Error>;
