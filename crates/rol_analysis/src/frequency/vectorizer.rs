use super::stopwords::StopWords;
use super::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    #[default]
    Count,
    TfIdf,
}

impl Weighting {
    pub fn from_tfidf(tfidf: bool) -> Self {
        if tfidf {
            Self::TfIdf
        } else {
            Self::Count
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub term: String,
    pub score: f64,
}

/// Bag-of-words scorer over a small corpus.
#[derive(Debug, Clone)]
pub struct TermVectorizer<'a> {
    stopwords: &'a StopWords,
    weighting: Weighting,
    max_features: Option<usize>,
}

impl<'a> TermVectorizer<'a> {
    pub fn new(stopwords: &'a StopWords, weighting: Weighting) -> Self {
        Self {
            stopwords,
            weighting,
            max_features: None,
        }
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Corpus-wide score per term, highest first. Ties are broken alphabetically.
    pub fn score<S: AsRef<str>>(&self, documents: &[S]) -> Vec<TermScore> {
        let counts: Vec<HashMap<String, usize>> = documents
            .iter()
            .map(|doc| self.count_tokens(doc.as_ref()))
            .collect();

        let vocabulary = self.vocabulary(&counts);
        if vocabulary.is_empty() {
            return Vec::new();
        }

        let mut scores: BTreeMap<&str, f64> =
            vocabulary.iter().map(|t| (t.as_str(), 0.0)).collect();
        match self.weighting {
            Weighting::Count => {
                for doc in &counts {
                    for (term, n) in doc {
                        if let Some(score) = scores.get_mut(term.as_str()) {
                            *score += *n as f64;
                        }
                    }
                }
            }
            Weighting::TfIdf => {
                let idf = smooth_idf(&counts, &scores);
                for doc in &counts {
                    let row: Vec<(&str, f64)> = doc
                        .iter()
                        .filter_map(|(term, n)| {
                            idf.get(term.as_str())
                                .map(|w| (term.as_str(), *n as f64 * w))
                        })
                        .collect();
                    let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                    if norm == 0.0 {
                        continue;
                    }
                    for (term, value) in row {
                        if let Some(score) = scores.get_mut(term) {
                            *score += value / norm;
                        }
                    }
                }
            }
        }

        let mut ranked: Vec<TermScore> = scores
            .into_iter()
            .map(|(term, score)| TermScore {
                term: term.to_string(),
                score,
            })
            .collect();
        // BTreeMap order is alphabetical and the sort is stable.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    fn count_tokens(&self, text: &str) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for token in tokenize(text) {
            if !self.stopwords.contains(&token) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Retained terms: all of them, or the `max_features` most frequent by raw count.
    fn vocabulary(&self, counts: &[HashMap<String, usize>]) -> Vec<String> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in counts {
            for (term, n) in doc {
                *totals.entry(term.as_str()).or_default() += n;
            }
        }

        let mut terms: Vec<(&str, usize)> = totals.into_iter().collect();
        if let Some(limit) = self.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1));
            terms.truncate(limit);
        }
        terms.into_iter().map(|(t, _)| t.to_string()).collect()
    }
}

/// `ln((1 + n) / (1 + df)) + 1` for every retained term.
fn smooth_idf<'v>(
    counts: &[HashMap<String, usize>],
    vocabulary: &BTreeMap<&'v str, f64>,
) -> HashMap<&'v str, f64> {
    let n = counts.len() as f64;
    vocabulary
        .keys()
        .map(|term| {
            let df = counts.iter().filter(|doc| doc.contains_key(*term)).count() as f64;
            (*term, ((1.0 + n) / (1.0 + df)).ln() + 1.0)
        })
        .collect()
}
