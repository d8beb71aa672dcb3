use chrono::NaiveDate;
use rol_core::{unique_by_id, Article, Country, CountryDataset, ImpactScore, Pillar};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Distinct articles for one (pillar, impact) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarImpactRow {
    pub pillar: Pillar,
    pub score: u8,
    pub impact: ImpactScore,
    pub count: usize,
    /// Percentage of the pillar's total
    pub share: f64,
}

/// Rows sorted by pillar ascending, then impact score descending.
/// Undefined-impact rows are left out. Pillars with no rows are absent.
pub fn pillar_impact_summary(articles: &[Article]) -> Vec<PillarImpactRow> {
    let mut groups: BTreeMap<(Pillar, ImpactScore), HashSet<&str>> = BTreeMap::new();
    for article in articles.iter().filter(|a| a.is_relevant()) {
        groups
            .entry((article.associated_pillar, article.impact_score))
            .or_default()
            .insert(article.id.as_str());
    }

    let mut totals: BTreeMap<Pillar, usize> = BTreeMap::new();
    for ((pillar, _), ids) in &groups {
        *totals.entry(*pillar).or_default() += ids.len();
    }

    let mut rows: Vec<PillarImpactRow> = groups
        .into_iter()
        .map(|((pillar, impact), ids)| {
            let total = totals.get(&pillar).copied().unwrap_or_default();
            let share = if total == 0 {
                0.0
            } else {
                ids.len() as f64 / total as f64 * 100.0
            };
            PillarImpactRow {
                pillar,
                score: impact.score(),
                impact,
                count: ids.len(),
                share,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.pillar.cmp(&b.pillar).then(b.impact.cmp(&a.impact)));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRow {
    pub week: NaiveDate,
    pub score: u8,
    pub impact: ImpactScore,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekTotal {
    pub week: NaiveDate,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    pub peak_week: NaiveDate,
    pub peak_total: usize,
    pub mean_total: f64,
    /// `mean_total` rounded half to even
    pub mean_display: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub rows: Vec<WeeklyRow>,
    pub totals: Vec<WeekTotal>,
    pub stats: Option<WeeklyStats>,
}

impl WeeklySummary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Weekly article counts per impact level, weeks starting on Monday.
pub fn weekly_summary(articles: &[Article]) -> WeeklySummary {
    let relevant = unique_by_id(articles.iter().filter(|a| a.is_relevant()));

    let mut counts: BTreeMap<(NaiveDate, ImpactScore), usize> = BTreeMap::new();
    for article in &relevant {
        *counts
            .entry((article.week_start(), article.impact_score))
            .or_default() += 1;
    }

    let rows: Vec<WeeklyRow> = counts
        .into_iter()
        .map(|((week, impact), count)| WeeklyRow {
            week,
            score: impact.score(),
            impact,
            count,
        })
        .collect();

    let mut per_week: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for row in &rows {
        *per_week.entry(row.week).or_default() += row.count;
    }
    let totals: Vec<WeekTotal> = per_week
        .into_iter()
        .map(|(week, total)| WeekTotal { week, total })
        .collect();

    let stats = weekly_stats(&totals);
    debug!("Weekly summary: {} rows over {} weeks", rows.len(), totals.len());

    WeeklySummary { rows, totals, stats }
}

fn weekly_stats(totals: &[WeekTotal]) -> Option<WeeklyStats> {
    // Totals are in week order, so the first maximum is the earliest week.
    let peak = totals.iter().fold(None::<&WeekTotal>, |best, t| match best {
        Some(b) if b.total >= t.total => Some(b),
        _ => Some(t),
    })?;

    let sum: usize = totals.iter().map(|t| t.total).sum();
    let mean_total = sum as f64 / totals.len() as f64;

    Some(WeeklyStats {
        peak_week: peak.week,
        peak_total: peak.total,
        mean_total,
        mean_display: mean_total.round_ties_even(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub country: Country,
    /// Source domains in order of first appearance
    pub sources: Vec<String>,
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub article_count: usize,
}

pub fn dataset_overview(dataset: &CountryDataset) -> DatasetOverview {
    let mut seen = HashSet::new();
    let sources = dataset
        .articles
        .iter()
        .filter(|a| seen.insert(a.domain_url.as_str()))
        .map(|a| a.domain_url.clone())
        .collect();

    let dates = dataset.articles.iter().map(|a| a.published_date);

    DatasetOverview {
        country: dataset.country,
        sources,
        earliest: dates.clone().min(),
        latest: dates.max(),
        article_count: dataset.article_count(),
    }
}
