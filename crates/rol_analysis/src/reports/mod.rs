use rol_core::{CountrySummary, Pillar};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub sentiment: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarReport {
    pub pillar: Pillar,
    pub title: String,
    pub reports: Vec<SentimentReport>,
}

/// Narratives for every pillar, in pillar order, ready for display.
pub fn media_reports(summary: &CountrySummary) -> Vec<PillarReport> {
    Pillar::ALL
        .into_iter()
        .map(|pillar| PillarReport {
            pillar,
            title: pillar.title().to_string(),
            reports: summary
                .narratives(pillar)
                .iter()
                .map(|n| SentimentReport {
                    sentiment: n.sentiment.clone(),
                    text: n.cleaned(),
                })
                .collect(),
        })
        .collect()
}
