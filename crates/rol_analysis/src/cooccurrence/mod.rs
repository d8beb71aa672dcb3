use ndarray::{Array2, Axis};
use rol_core::{unique_by_id, Article, Pillar};
use serde::{Deserialize, Serialize};

/// Pillar-by-pillar article counts and their column-normalized shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooccurrenceMatrix {
    pub pillars: Vec<Pillar>,
    /// `raw[i][j]`: articles flagged for both pillar i and pillar j
    pub raw: Vec<Vec<u64>>,
    /// Each column of `raw` as a percentage of its sum
    pub percentage: Vec<Vec<f64>>,
}

impl CooccurrenceMatrix {
    pub fn get(&self, row: Pillar, column: Pillar) -> u64 {
        self.raw[row.index()][column.index()]
    }
}

pub fn cooccurrence(articles: &[Article]) -> CooccurrenceMatrix {
    let unique = unique_by_id(articles);

    let mut indicators = Array2::<f64>::zeros((unique.len(), Pillar::COUNT));
    for (row, article) in unique.iter().enumerate() {
        for pillar in Pillar::ALL {
            if article.pillars.contains(pillar) {
                indicators[[row, pillar.index()]] = 1.0;
            }
        }
    }

    let raw = indicators.t().dot(&indicators);
    let percentage = column_percentages(&raw);

    CooccurrenceMatrix {
        pillars: Pillar::ALL.to_vec(),
        raw: raw
            .rows()
            .into_iter()
            .map(|r| r.iter().map(|v| *v as u64).collect())
            .collect(),
        percentage: percentage
            .rows()
            .into_iter()
            .map(|r| r.to_vec())
            .collect(),
    }
}

fn column_percentages(matrix: &Array2<f64>) -> Array2<f64> {
    let sums = matrix.sum_axis(Axis(0));
    let mut out = matrix.clone();
    for (mut column, sum) in out.axis_iter_mut(Axis(1)).zip(sums.iter()) {
        if *sum == 0.0 {
            column.fill(0.0);
        } else {
            column.mapv_inplace(|v| v / sum * 100.0);
        }
    }
    out
}
