use async_trait::async_trait;
use crate::types::{Article, Country, CountryDataset, CountrySummary};
use crate::Result;

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Short backend name, used in logs
    fn name(&self) -> &str;

    /// Load the article table for a country
    async fn load_articles(&self, country: Country) -> Result<Vec<Article>>;

    /// Load the pillar/sentiment narrative document for a country
    async fn load_summary(&self, country: Country) -> Result<CountrySummary>;

    /// Countries this source holds an article table for
    async fn available_countries(&self) -> Result<Vec<Country>>;

    /// Load everything needed for one session
    async fn load_dataset(&self, country: Country) -> Result<CountryDataset> {
        let articles = self.load_articles(country).await?;
        let summary = self.load_summary(country).await?;
        Ok(CountryDataset::new(country, articles, summary))
    }
}
