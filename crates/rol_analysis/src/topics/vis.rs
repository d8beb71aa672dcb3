//! Inter-topic distance map and term bars for a fitted topic model.

use super::dictionary::Dictionary;
use super::lda::LdaModel;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Terms listed per topic.
pub const TERMS_PER_TOPIC: usize = 30;

const POWER_ITERATIONS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermRelevance {
    pub term: String,
    /// p(term | topic)
    pub probability: f64,
    /// p(term | topic) / p(term)
    pub lift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCoordinates {
    /// 1-based rank by size
    pub rank: usize,
    /// Index in the fitted model
    pub topic: usize,
    pub x: f64,
    pub y: f64,
    /// Share of corpus tokens, in percent
    pub share: f64,
    pub terms: Vec<TermRelevance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicVisualization {
    pub topics: Vec<TopicCoordinates>,
}

impl TopicVisualization {
    pub fn prepare(model: &LdaModel, dictionary: &Dictionary) -> Self {
        let k = model.num_topics();

        let topic_mass = model
            .doc_topic
            .t()
            .dot(&model.doc_lengths);
        let mass_total = topic_mass.sum();
        let shares: Vec<f64> = topic_mass
            .iter()
            .map(|m| if mass_total > 0.0 { m / mass_total * 100.0 } else { 100.0 / k as f64 })
            .collect();

        let frequencies = dictionary.frequencies();
        let token_total: usize = frequencies.iter().sum();
        let term_share: Vec<f64> = frequencies
            .iter()
            .map(|f| if token_total == 0 { 0.0 } else { *f as f64 / token_total as f64 })
            .collect();

        let distances = jensen_shannon_matrix(&model.topic_term);
        let coordinates = principal_coordinates(&distances);

        let mut order: Vec<usize> = (0..k).collect();
        order.sort_by(|a, b| shares[*b].total_cmp(&shares[*a]).then(a.cmp(b)));

        let topics = order
            .into_iter()
            .enumerate()
            .map(|(rank, topic)| {
                let row = model.topic_term.row(topic);
                let mut terms: Vec<TermRelevance> = row
                    .iter()
                    .enumerate()
                    .map(|(id, p)| TermRelevance {
                        term: dictionary.term(id).to_string(),
                        probability: *p,
                        lift: if term_share[id] > 0.0 { p / term_share[id] } else { 0.0 },
                    })
                    .collect();
                terms.sort_by(|a, b| b.probability.total_cmp(&a.probability));
                terms.truncate(TERMS_PER_TOPIC);

                TopicCoordinates {
                    rank: rank + 1,
                    topic,
                    x: coordinates[[topic, 0]],
                    y: coordinates[[topic, 1]],
                    share: shares[topic],
                    terms,
                }
            })
            .collect();

        Self { topics }
    }

    /// Standalone HTML page: distance map on the left, term bars on the right.
    pub fn render_html(&self, title: &str) -> String {
        let mut html = String::new();
        // Writing into a String cannot fail.
        self.write_document(&mut html, title).ok();
        html
    }

    fn write_document(&self, html: &mut String, title: &str) -> fmt::Result {
        write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n<h1>{}</h1>\n<div class=\"panels\">\n",
            escape(title),
            STYLE,
            escape(title)
        )?;
        self.render_map(html)?;
        html.push_str("<div class=\"terms\">\n");
        for topic in &self.topics {
            self.render_terms(html, topic)?;
        }
        html.push_str("</div>\n</div>\n</body>\n</html>\n");
        Ok(())
    }

    fn render_map(&self, html: &mut String) -> fmt::Result {
        const SIZE: f64 = 520.0;
        const MARGIN: f64 = 60.0;

        let extent = self
            .topics
            .iter()
            .flat_map(|t| [t.x.abs(), t.y.abs()])
            .fold(0.0_f64, f64::max);
        let scale = if extent > 0.0 { (SIZE / 2.0 - MARGIN) / extent } else { 0.0 };
        let center = SIZE / 2.0;

        writeln!(
            html,
            "<svg class=\"map\" width=\"{SIZE}\" height=\"{SIZE}\" viewBox=\"0 0 {SIZE} {SIZE}\">"
        )?;
        writeln!(
            html,
            "<line x1=\"0\" y1=\"{center}\" x2=\"{SIZE}\" y2=\"{center}\" class=\"axis\"/><line x1=\"{center}\" y1=\"0\" x2=\"{center}\" y2=\"{SIZE}\" class=\"axis\"/>"
        )?;
        for topic in &self.topics {
            let cx = center + topic.x * scale;
            let cy = center - topic.y * scale;
            let r = 8.0 + topic.share.max(0.0).sqrt() * 5.0;
            writeln!(
                html,
                "<g><title>Topic {} ({:.1}% of tokens)</title><circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\"/><text x=\"{:.2}\" y=\"{:.2}\">{}</text></g>",
                topic.rank, topic.share, cx, cy, r, cx, cy + 4.0, topic.rank
            )?;
        }
        html.push_str("</svg>\n");
        Ok(())
    }

    fn render_terms(&self, html: &mut String, topic: &TopicCoordinates) -> fmt::Result {
        let top = topic.terms.first().map(|t| t.probability).unwrap_or(0.0);
        writeln!(
            html,
            "<section><h2>Topic {} <small>{:.1}% of tokens</small></h2>\n<table>\n<tr><th>Term</th><th>Probability</th><th>Lift</th><th></th></tr>",
            topic.rank, topic.share
        )?;
        for term in &topic.terms {
            let width = if top > 0.0 { term.probability / top * 100.0 } else { 0.0 };
            writeln!(
                html,
                "<tr><td>{}</td><td>{:.4}</td><td>{:.2}</td><td><div class=\"bar\" style=\"width:{:.1}%\"></div></td></tr>",
                escape(&term.term),
                term.probability,
                term.lift,
                width
            )?;
        }
        html.push_str("</table>\n</section>\n");
        Ok(())
    }
}

const STYLE: &str = "body { font-family: sans-serif; margin: 1.5rem; }
.panels { display: flex; gap: 2rem; align-items: flex-start; }
.map circle { fill: #1f77b4; fill-opacity: 0.45; stroke: #1f77b4; }
.map text { font-size: 12px; text-anchor: middle; }
.axis { stroke: #ccc; }
.terms { max-height: 90vh; overflow-y: auto; flex: 1; }
table { border-collapse: collapse; width: 100%; font-size: 13px; }
td, th { padding: 2px 6px; text-align: left; }
.bar { background: #d62728; height: 10px; }
";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Pairwise Jensen-Shannon divergence (natural log) between the rows of `dists`.
pub fn jensen_shannon_matrix(dists: &Array2<f64>) -> Array2<f64> {
    let n = dists.nrows();
    let mut out = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = jensen_shannon(&dists.row(i).to_vec(), &dists.row(j).to_vec());
            out[[i, j]] = d;
            out[[j, i]] = d;
        }
    }
    out
}

fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    let mut divergence = 0.0;
    for (a, b) in p.iter().zip(q) {
        let m = (a + b) / 2.0;
        if *a > 0.0 {
            divergence += 0.5 * a * (a / m).ln();
        }
        if *b > 0.0 {
            divergence += 0.5 * b * (b / m).ln();
        }
    }
    divergence.max(0.0)
}

/// Classical multidimensional scaling of a distance matrix into two dimensions.
pub fn principal_coordinates(distances: &Array2<f64>) -> Array2<f64> {
    let n = distances.nrows();
    let mut coordinates = Array2::zeros((n, 2));
    if n < 2 {
        return coordinates;
    }

    // B = -1/2 · J · D² · J with J the centering matrix
    let squared = distances.mapv(|d| d * d);
    let row_means = squared.mean_axis(Axis(1)).unwrap_or_else(|| Array1::zeros(n));
    let col_means = squared.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(n));
    let grand_mean = squared.mean().unwrap_or(0.0);
    let mut b = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            b[[i, j]] = -0.5 * (squared[[i, j]] - row_means[i] - col_means[j] + grand_mean);
        }
    }

    for component in 0..2 {
        let (value, vector) = dominant_eigenpair(&b);
        if value <= 1e-12 {
            break;
        }
        let scale = value.sqrt();
        for i in 0..n {
            coordinates[[i, component]] = vector[i] * scale;
        }
        // deflate
        for i in 0..n {
            for j in 0..n {
                b[[i, j]] -= value * vector[i] * vector[j];
            }
        }
    }
    coordinates
}

/// Largest algebraic eigenvalue of a symmetric matrix and its unit eigenvector.
fn dominant_eigenpair(matrix: &Array2<f64>) -> (f64, Array1<f64>) {
    let n = matrix.nrows();
    // Shifting by the Frobenius norm makes every eigenvalue non-negative.
    let shift = matrix.mapv(|v| v * v).sum().sqrt();
    // Uneven start so the iteration is not orthogonal to the leading vector.
    let mut vector: Array1<f64> = (0..n).map(|i| 1.0 + i as f64 / n as f64).collect();
    let norm = vector.dot(&vector).sqrt();
    vector.mapv_inplace(|v| v / norm);

    if shift < 1e-15 {
        return (0.0, vector);
    }

    for _ in 0..POWER_ITERATIONS {
        let next = matrix.dot(&vector) + &vector * shift;
        let norm = next.dot(&next).sqrt();
        if norm < 1e-15 {
            return (0.0, vector);
        }
        let next = next / norm;
        let delta = (&next - &vector).mapv(f64::abs).sum();
        vector = next;
        if delta < 1e-12 {
            break;
        }
    }

    let value = vector.dot(&matrix.dot(&vector));
    (value, vector)
}
