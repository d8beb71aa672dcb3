use async_trait::async_trait;
use rol_core::{Article, Country, CountrySummary, DashboardConfig, DatasetSource, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use crate::SourceBackend;

/// On-disk fixture format for the memory backend: one file per country at
/// `<data_dir>/fixtures/<Country>.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureBundle {
    pub articles: Vec<Article>,
    #[serde(default)]
    pub summary: CountrySummary,
}

pub struct MemoryStore {
    datasets: HashMap<Country, FixtureBundle>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            datasets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, country: Country, bundle: FixtureBundle) {
        self.datasets.insert(country, bundle);
    }

    fn get(&self, country: Country) -> Result<&FixtureBundle> {
        self.datasets.get(&country).ok_or_else(|| Error::DataUnavailable {
            country: country.to_string(),
            path: format!("memory://{}", country),
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Dataset source held entirely in memory. Used for tests and demos.
#[derive(Clone, Default)]
pub struct MemorySource {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, country: Country, articles: Vec<Article>, summary: CountrySummary) {
        let mut store = self.store.write().await;
        store.insert(country, FixtureBundle { articles, summary });
    }

    /// Load every `<Country>.json` bundle found in `dir`. Unknown file names are skipped.
    pub async fn from_fixture_dir(dir: &Path) -> Result<Self> {
        let source = Self::new();
        if !dir.is_dir() {
            debug!("No fixture directory at {}", dir.display());
            return Ok(source);
        }

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(country) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<Country>().ok())
            else {
                debug!("Skipping fixture {}", path.display());
                continue;
            };
            let raw = tokio::fs::read_to_string(&path).await?;
            let bundle: FixtureBundle = serde_json::from_str(&raw)?;
            info!("📦 Loaded {} fixture articles for {}", bundle.articles.len(), country);
            source.store.write().await.insert(country, bundle);
        }
        Ok(source)
    }
}

#[async_trait]
impl SourceBackend for MemorySource {
    fn get_error_message() -> &'static str {
        "Memory source should always be available"
    }

    async fn open(config: &DashboardConfig) -> Result<Self> {
        Self::from_fixture_dir(&config.data_dir.join("fixtures")).await
    }
}

#[async_trait]
impl DatasetSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_articles(&self, country: Country) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.get(country)?.articles.clone())
    }

    async fn load_summary(&self, country: Country) -> Result<CountrySummary> {
        let store = self.store.read().await;
        Ok(store.get(country)?.summary.clone())
    }

    async fn available_countries(&self) -> Result<Vec<Country>> {
        let store = self.store.read().await;
        let mut countries: Vec<Country> = store.datasets.keys().copied().collect();
        countries.sort();
        Ok(countries)
    }
}
