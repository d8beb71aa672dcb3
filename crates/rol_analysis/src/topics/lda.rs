//! Latent Dirichlet Allocation fitted with collapsed Gibbs sampling.

use super::dictionary::BagOfWords;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Document-topic prior
    pub alpha: f64,
    /// Topic-term prior
    pub eta: f64,
    /// Sampling sweeps over the corpus
    pub passes: usize,
    pub seed: Option<u64>,
}

impl LdaConfig {
    /// Symmetric priors `1 / num_topics`.
    pub fn new(num_topics: usize, passes: usize) -> Self {
        let prior = 1.0 / num_topics.max(1) as f64;
        Self {
            num_topics,
            alpha: prior,
            eta: prior,
            passes,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LdaModel {
    /// K × V, rows sum to one
    pub topic_term: Array2<f64>,
    /// D × K, rows sum to one
    pub doc_topic: Array2<f64>,
    /// Tokens per document
    pub doc_lengths: Array1<f64>,
}

impl LdaModel {
    pub fn num_topics(&self) -> usize {
        self.topic_term.nrows()
    }
}

pub fn fit(corpus: &[BagOfWords], num_terms: usize, config: &LdaConfig) -> LdaModel {
    let k = config.num_topics;
    let n_docs = corpus.len();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let tokens: Vec<Vec<usize>> = corpus
        .iter()
        .map(|bow| {
            bow.iter()
                .flat_map(|&(id, count)| std::iter::repeat(id).take(count))
                .collect()
        })
        .collect();

    let mut topic_term = Array2::<f64>::zeros((k, num_terms));
    let mut doc_topic = Array2::<f64>::zeros((n_docs, k));
    let mut topic_totals = Array1::<f64>::zeros(k);
    let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(n_docs);

    for (d, doc) in tokens.iter().enumerate() {
        let mut doc_assignments = Vec::with_capacity(doc.len());
        for &w in doc {
            let z = rng.gen_range(0..k);
            topic_term[[z, w]] += 1.0;
            doc_topic[[d, z]] += 1.0;
            topic_totals[z] += 1.0;
            doc_assignments.push(z);
        }
        assignments.push(doc_assignments);
    }

    let eta_sum = config.eta * num_terms as f64;
    let mut weights = vec![0.0; k];

    for pass in 0..config.passes {
        for (d, doc) in tokens.iter().enumerate() {
            for (i, &w) in doc.iter().enumerate() {
                let old = assignments[d][i];
                topic_term[[old, w]] -= 1.0;
                doc_topic[[d, old]] -= 1.0;
                topic_totals[old] -= 1.0;

                let mut total = 0.0;
                for (t, weight) in weights.iter_mut().enumerate() {
                    *weight = (doc_topic[[d, t]] + config.alpha) * (topic_term[[t, w]] + config.eta)
                        / (topic_totals[t] + eta_sum);
                    total += *weight;
                }
                let new = sample(&weights, total, &mut rng);

                topic_term[[new, w]] += 1.0;
                doc_topic[[d, new]] += 1.0;
                topic_totals[new] += 1.0;
                assignments[d][i] = new;
            }
        }
        debug!("LDA pass {}/{} done", pass + 1, config.passes);
    }

    let doc_lengths: Array1<f64> = tokens.iter().map(|doc| doc.len() as f64).collect();

    let mut phi = topic_term;
    for (t, mut row) in phi.rows_mut().into_iter().enumerate() {
        let denom = topic_totals[t] + eta_sum;
        row.mapv_inplace(|c| (c + config.eta) / denom);
    }

    let k_alpha = k as f64 * config.alpha;
    let mut theta = doc_topic;
    for (d, mut row) in theta.rows_mut().into_iter().enumerate() {
        let denom = doc_lengths[d] + k_alpha;
        row.mapv_inplace(|c| (c + config.alpha) / denom);
    }

    LdaModel {
        topic_term: phi,
        doc_topic: theta,
        doc_lengths,
    }
}

fn sample<R: Rng>(weights: &[f64], total: f64, rng: &mut R) -> usize {
    let mut target = rng.gen::<f64>() * total;
    for (t, weight) in weights.iter().enumerate() {
        target -= weight;
        if target <= 0.0 {
            return t;
        }
    }
    weights.len() - 1
}
