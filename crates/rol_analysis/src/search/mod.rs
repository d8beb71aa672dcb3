//! Keyword search over article summaries.
//!
//! Whitespace-separated terms must all match (AND); `|` inside a term, or the
//! word `OR` between terms, gives alternatives. Terms are case-insensitive
//! regular expressions matched anywhere in the summary.

use regex::{RegexSet, RegexSetBuilder};
use rol_core::{Article, Error, ImpactScore, Pillar, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SearchQuery {
    terms: Vec<String>,
    patterns: Option<RegexSet>,
}

impl SearchQuery {
    pub fn compile(raw: &str) -> Result<Self> {
        let normalized = raw.replace(" OR ", "|");
        let terms: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        if terms.is_empty() {
            return Ok(Self {
                terms,
                patterns: None,
            });
        }

        let patterns = RegexSetBuilder::new(&terms)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::InvalidQuery(e.to_string()))?;

        Ok(Self {
            terms,
            patterns: Some(patterns),
        })
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.patterns {
            Some(set) => set.matches(text).matched_all(),
            None => true,
        }
    }
}

/// Display record for one matching article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleView {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub source: String,
    /// e.g. `March 04, 2024`
    pub date: String,
    pub impact: ImpactScore,
    pub link: String,
}

impl From<&Article> for ArticleView {
    fn from(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            summary: article.summary.clone(),
            content: article.content.clone(),
            source: article.domain_url.clone(),
            date: article.published_date.format("%B %d, %Y").to_string(),
            impact: article.impact_score,
            link: article.link.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub count: usize,
    pub results: Vec<ArticleView>,
}

/// Articles of `pillar` with the given impact whose summary matches `query`.
pub fn search(
    articles: &[Article],
    pillar: Pillar,
    impact: ImpactScore,
    query: &str,
) -> Result<SearchResults> {
    let query = SearchQuery::compile(query)?;
    let results: Vec<ArticleView> = articles
        .iter()
        .filter(|a| a.associated_pillar == pillar && a.impact_score == impact)
        .filter(|a| query.is_match(&a.summary))
        .map(ArticleView::from)
        .collect();

    debug!("Search {:?} matched {} articles", query.terms(), results.len());
    Ok(SearchResults {
        count: results.len(),
        results,
    })
}
