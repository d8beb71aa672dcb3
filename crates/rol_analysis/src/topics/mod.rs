//! Topic modelling for the articles of one pillar.

pub mod dictionary;
pub mod lda;
pub mod vis;

use rol_core::{Article, Error, ImpactScore, Pillar, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use dictionary::{BagOfWords, Dictionary};
pub use lda::{LdaConfig, LdaModel};
pub use vis::{TermRelevance, TopicCoordinates, TopicVisualization};

/// Terms kept in [`Topic::top_terms`].
const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRequest {
    pub pillar: Pillar,
    pub num_topics: usize,
    /// Empty means every impact level
    #[serde(default)]
    pub sentiments: Vec<ImpactScore>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TopicRequest {
    pub fn new(pillar: Pillar, num_topics: usize) -> Self {
        Self {
            pillar,
            num_topics,
            sentiments: Vec::new(),
            seed: None,
        }
    }

    pub fn with_sentiments(mut self, sentiments: Vec<ImpactScore>) -> Self {
        self.sentiments = sentiments;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermWeight {
    pub term: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: usize,
    /// Weight per vocabulary entry, sums to one
    pub distribution: Vec<f64>,
    pub top_terms: Vec<TermWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicReport {
    pub pillar: Pillar,
    pub num_topics: usize,
    pub document_count: usize,
    pub vocabulary: Vec<String>,
    pub topics: Vec<Topic>,
    /// Topic mixture per document
    pub document_topics: Vec<Vec<f64>>,
    pub visualization: Option<TopicVisualization>,
}

impl TopicReport {
    fn empty(request: &TopicRequest, document_count: usize) -> Self {
        Self {
            pillar: request.pillar,
            num_topics: request.num_topics,
            document_count,
            vocabulary: Vec::new(),
            topics: Vec::new(),
            document_topics: Vec::new(),
            visualization: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Standalone HTML page for the report, if there is anything to draw.
    pub fn render_html(&self) -> Option<String> {
        self.visualization.as_ref().map(|vis| {
            vis.render_html(&format!(
                "{}: {} topics",
                self.pillar.title(),
                self.num_topics
            ))
        })
    }
}

/// Fits LDA models with a fixed pass count and an upper bound on topics.
#[derive(Debug, Clone)]
pub struct TopicModeller {
    passes: usize,
    max_topics: usize,
}

impl TopicModeller {
    pub fn new(passes: usize, max_topics: usize) -> Self {
        Self { passes, max_topics }
    }

    pub fn fit(&self, articles: &[Article], request: &TopicRequest) -> Result<TopicReport> {
        if request.num_topics == 0 || request.num_topics > self.max_topics {
            return Err(Error::InvalidInput(format!(
                "Number of topics must be between 1 and {}, got {}",
                self.max_topics, request.num_topics
            )));
        }

        let documents: Vec<Vec<&str>> = articles
            .iter()
            .filter(|a| a.associated_pillar == request.pillar)
            .filter(|a| {
                request.sentiments.is_empty() || request.sentiments.contains(&a.impact_score)
            })
            .map(|a| a.cleaned_text.split_whitespace().collect())
            .collect();

        let dictionary = Dictionary::from_documents(&documents);
        if dictionary.is_empty() {
            debug!("No tokens for {}; returning an empty topic report", request.pillar);
            return Ok(TopicReport::empty(request, documents.len()));
        }

        let corpus: Vec<BagOfWords> = documents.iter().map(|d| dictionary.doc2bow(d)).collect();
        info!(
            "🧠 Fitting {} topics over {} documents ({} terms)",
            request.num_topics,
            corpus.len(),
            dictionary.len()
        );

        let config = LdaConfig::new(request.num_topics, self.passes).with_seed(request.seed);
        let model = lda::fit(&corpus, dictionary.len(), &config);
        let visualization = TopicVisualization::prepare(&model, &dictionary);

        let topics = model
            .topic_term
            .rows()
            .into_iter()
            .enumerate()
            .map(|(id, row)| {
                let distribution = row.to_vec();
                let mut ranked: Vec<(usize, f64)> =
                    distribution.iter().copied().enumerate().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
                let top_terms = ranked
                    .into_iter()
                    .take(TOP_TERMS)
                    .map(|(term, weight)| TermWeight {
                        term: dictionary.term(term).to_string(),
                        weight,
                    })
                    .collect();
                Topic {
                    id,
                    distribution,
                    top_terms,
                }
            })
            .collect();

        Ok(TopicReport {
            pillar: request.pillar,
            num_topics: request.num_topics,
            document_count: corpus.len(),
            vocabulary: dictionary.terms().to_vec(),
            topics,
            document_topics: model.doc_topic.rows().into_iter().map(|r| r.to_vec()).collect(),
            visualization: Some(visualization),
        })
    }
}
