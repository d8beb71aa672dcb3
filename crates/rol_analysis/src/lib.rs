pub mod aggregate;
pub mod cooccurrence;
pub mod frequency;
pub mod reports;
pub mod search;
pub mod topics;

pub use aggregate::{dataset_overview, pillar_impact_summary, weekly_summary};
pub use cooccurrence::cooccurrence;
pub use frequency::{default_user_stopwords, StopWords, TermExtractor, Weighting};
pub use reports::media_reports;
pub use search::{search, ArticleView, SearchQuery, SearchResults};
pub use topics::{TopicModeller, TopicReport, TopicRequest};

pub mod prelude {
    pub use super::aggregate::*;
    pub use super::cooccurrence::*;
    pub use super::frequency::{
        default_user_stopwords, PillarTerms, SentimentTerms, StopWords, TermExtractor, TermScore,
        Weighting,
    };
    pub use super::reports::*;
    pub use super::search::*;
    pub use super::topics::{TopicModeller, TopicReport, TopicRequest};
    pub use rol_core::{Article, CountryDataset, Error, ImpactScore, Pillar, Result, TextField};
}
