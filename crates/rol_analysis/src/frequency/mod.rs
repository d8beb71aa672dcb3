//! Most frequent terms or entities per pillar and per impact level.

pub mod stopwords;
pub mod tokenizer;
pub mod vectorizer;

use rol_core::{Article, ImpactScore, Pillar, TextField};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use stopwords::{default_user_stopwords, StopWords, EXCLUDED_TERMS};
pub use tokenizer::tokenize;
pub use vectorizer::{TermScore, TermVectorizer, Weighting};

/// Cap on distinct terms used by the overview tables.
pub const DEFAULT_TERM_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarTerms {
    pub pillar: Pillar,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentTerms {
    pub impact: ImpactScore,
    pub terms: Vec<String>,
}

/// Scores one text column of an article table.
#[derive(Debug, Clone)]
pub struct TermExtractor {
    field: TextField,
    stopwords: StopWords,
    weighting: Weighting,
    limit: usize,
}

impl TermExtractor {
    pub fn new(field: TextField, stopwords: StopWords) -> Self {
        Self {
            field,
            stopwords,
            weighting: Weighting::Count,
            limit: DEFAULT_TERM_LIMIT,
        }
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Up to `limit` terms from the articles of `pillar`, optionally one impact level only.
    pub fn top_terms(
        &self,
        articles: &[Article],
        pillar: Pillar,
        impact: Option<ImpactScore>,
    ) -> Vec<TermScore> {
        let texts = self.texts(articles, pillar, impact);
        TermVectorizer::new(&self.stopwords, self.weighting)
            .with_max_features(Some(self.limit))
            .score(&texts)
    }

    /// Every term of the pillar with its score, for word-cloud style displays.
    pub fn term_scores(&self, articles: &[Article], pillar: Pillar) -> Vec<TermScore> {
        let texts = self.texts(articles, pillar, None);
        TermVectorizer::new(&self.stopwords, self.weighting).score(&texts)
    }

    pub fn top_terms_by_pillar(&self, articles: &[Article]) -> Vec<PillarTerms> {
        Pillar::ALL
            .into_iter()
            .map(|pillar| PillarTerms {
                pillar,
                terms: term_names(self.top_terms(articles, pillar, None)),
            })
            .collect()
    }

    pub fn top_terms_by_sentiment(
        &self,
        articles: &[Article],
        pillar: Pillar,
    ) -> Vec<SentimentTerms> {
        ImpactScore::SENTIMENTS
            .into_iter()
            .map(|impact| SentimentTerms {
                impact,
                terms: term_names(self.top_terms(articles, pillar, Some(impact))),
            })
            .collect()
    }

    fn texts<'a>(
        &self,
        articles: &'a [Article],
        pillar: Pillar,
        impact: Option<ImpactScore>,
    ) -> Vec<&'a str> {
        let texts: Vec<&str> = articles
            .iter()
            .filter(|a| a.associated_pillar == pillar)
            .filter(|a| impact.map_or(true, |i| a.impact_score == i))
            .map(|a| a.text(self.field))
            .collect();
        debug!(
            "Scoring {} documents for {} ({:?}, {:?})",
            texts.len(),
            pillar,
            impact,
            self.weighting
        );
        texts
    }
}

fn term_names(scores: Vec<TermScore>) -> Vec<String> {
    scores.into_iter().map(|s| s.term).collect()
}
