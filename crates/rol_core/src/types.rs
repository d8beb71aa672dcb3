use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::{Error, Result};

/// EU member states covered by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    Austria,
    Belgium,
    Bulgaria,
    Croatia,
    Cyprus,
    Czechia,
    Denmark,
    Estonia,
    Finland,
    France,
    Germany,
    Greece,
    Hungary,
    Ireland,
    Italy,
    Latvia,
    Lithuania,
    Luxembourg,
    Malta,
    Netherlands,
    Poland,
    Portugal,
    Romania,
    Slovakia,
    Slovenia,
    Spain,
    Sweden,
}

impl Country {
    pub const ALL: [Country; 27] = [
        Country::Austria,
        Country::Belgium,
        Country::Bulgaria,
        Country::Croatia,
        Country::Cyprus,
        Country::Czechia,
        Country::Denmark,
        Country::Estonia,
        Country::Finland,
        Country::France,
        Country::Germany,
        Country::Greece,
        Country::Hungary,
        Country::Ireland,
        Country::Italy,
        Country::Latvia,
        Country::Lithuania,
        Country::Luxembourg,
        Country::Malta,
        Country::Netherlands,
        Country::Poland,
        Country::Portugal,
        Country::Romania,
        Country::Slovakia,
        Country::Slovenia,
        Country::Spain,
        Country::Sweden,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Country::Austria => "Austria",
            Country::Belgium => "Belgium",
            Country::Bulgaria => "Bulgaria",
            Country::Croatia => "Croatia",
            Country::Cyprus => "Cyprus",
            Country::Czechia => "Czechia",
            Country::Denmark => "Denmark",
            Country::Estonia => "Estonia",
            Country::Finland => "Finland",
            Country::France => "France",
            Country::Germany => "Germany",
            Country::Greece => "Greece",
            Country::Hungary => "Hungary",
            Country::Ireland => "Ireland",
            Country::Italy => "Italy",
            Country::Latvia => "Latvia",
            Country::Lithuania => "Lithuania",
            Country::Luxembourg => "Luxembourg",
            Country::Malta => "Malta",
            Country::Netherlands => "Netherlands",
            Country::Poland => "Poland",
            Country::Portugal => "Portugal",
            Country::Romania => "Romania",
            Country::Slovakia => "Slovakia",
            Country::Slovenia => "Slovenia",
            Country::Spain => "Spain",
            Country::Sweden => "Sweden",
        }
    }

    /// Lowercase name, used for summary documents and default stopwords.
    pub fn slug(&self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Country {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Country::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown country: {}", s)))
    }
}

/// The eight thematic pillars, declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pillar {
    #[serde(rename = "Pillar 1")]
    ConstraintsOnGovernmentPowers,
    #[serde(rename = "Pillar 2")]
    AbsenceOfCorruption,
    #[serde(rename = "Pillar 3")]
    OpenGovernment,
    #[serde(rename = "Pillar 4")]
    FundamentalFreedoms,
    #[serde(rename = "Pillar 5")]
    OrderAndSecurity,
    #[serde(rename = "Pillar 6")]
    RegulatoryEnforcement,
    #[serde(rename = "Pillar 7")]
    CivilJustice,
    #[serde(rename = "Pillar 8")]
    CriminalJustice,
}

impl Pillar {
    pub const COUNT: usize = 8;

    pub const ALL: [Pillar; Pillar::COUNT] = [
        Pillar::ConstraintsOnGovernmentPowers,
        Pillar::AbsenceOfCorruption,
        Pillar::OpenGovernment,
        Pillar::FundamentalFreedoms,
        Pillar::OrderAndSecurity,
        Pillar::RegulatoryEnforcement,
        Pillar::CivilJustice,
        Pillar::CriminalJustice,
    ];

    /// Zero-based position, matching the `pillar_N` indicator columns.
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based pillar number.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn from_number(number: usize) -> Result<Self> {
        number
            .checked_sub(1)
            .and_then(|i| Pillar::ALL.get(i).copied())
            .ok_or_else(|| Error::InvalidInput(format!("Pillar number out of range: {}", number)))
    }

    pub fn label(self) -> &'static str {
        match self {
            Pillar::ConstraintsOnGovernmentPowers => "Pillar 1",
            Pillar::AbsenceOfCorruption => "Pillar 2",
            Pillar::OpenGovernment => "Pillar 3",
            Pillar::FundamentalFreedoms => "Pillar 4",
            Pillar::OrderAndSecurity => "Pillar 5",
            Pillar::RegulatoryEnforcement => "Pillar 6",
            Pillar::CivilJustice => "Pillar 7",
            Pillar::CriminalJustice => "Pillar 8",
        }
    }

    /// Name of the binary membership column for this pillar.
    pub fn column(self) -> &'static str {
        match self {
            Pillar::ConstraintsOnGovernmentPowers => "pillar_1",
            Pillar::AbsenceOfCorruption => "pillar_2",
            Pillar::OpenGovernment => "pillar_3",
            Pillar::FundamentalFreedoms => "pillar_4",
            Pillar::OrderAndSecurity => "pillar_5",
            Pillar::RegulatoryEnforcement => "pillar_6",
            Pillar::CivilJustice => "pillar_7",
            Pillar::CriminalJustice => "pillar_8",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Pillar::ConstraintsOnGovernmentPowers => "Constraints on Government Powers",
            Pillar::AbsenceOfCorruption => "Absence of Corruption",
            Pillar::OpenGovernment => "Open Government",
            Pillar::FundamentalFreedoms => "Fundamental Freedoms",
            Pillar::OrderAndSecurity => "Order and Security",
            Pillar::RegulatoryEnforcement => "Regulatory Enforcement",
            Pillar::CivilJustice => "Civil Justice",
            Pillar::CriminalJustice => "Criminal Justice",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pillar {
    type Err = Error;

    /// Accepts `Pillar 3`, `pillar_3` or a bare `3`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let digits = lower
            .strip_prefix("pillar")
            .unwrap_or(lower.as_str())
            .trim_start_matches(|c: char| c == '_' || c == ' ');
        digits
            .parse::<usize>()
            .map_err(|_| Error::InvalidInput(format!("Unknown pillar: {}", s)))
            .and_then(Pillar::from_number)
    }
}

/// Ordinal impact of an article on its pillar. Shared by every component
/// that needs the score-to-label mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpactScore {
    #[serde(rename = "Undefined")]
    Undefined,
    #[serde(rename = "Very Negative")]
    VeryNegative,
    #[serde(rename = "Negative")]
    Negative,
    #[serde(rename = "Neutral")]
    Neutral,
    #[serde(rename = "Positive")]
    Positive,
    #[serde(rename = "Very Positive")]
    VeryPositive,
}

impl ImpactScore {
    pub const ALL: [ImpactScore; 6] = [
        ImpactScore::Undefined,
        ImpactScore::VeryNegative,
        ImpactScore::Negative,
        ImpactScore::Neutral,
        ImpactScore::Positive,
        ImpactScore::VeryPositive,
    ];

    /// Sentiment buckets offered for filtering, most positive first.
    pub const SENTIMENTS: [ImpactScore; 5] = [
        ImpactScore::VeryPositive,
        ImpactScore::Positive,
        ImpactScore::Neutral,
        ImpactScore::Negative,
        ImpactScore::VeryNegative,
    ];

    pub fn from_score(score: i64) -> Result<Self> {
        usize::try_from(score)
            .ok()
            .and_then(|i| ImpactScore::ALL.get(i).copied())
            .ok_or_else(|| Error::InvalidData(format!("Impact score out of range: {}", score)))
    }

    pub fn score(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ImpactScore::Undefined => "Undefined",
            ImpactScore::VeryNegative => "Very Negative",
            ImpactScore::Negative => "Negative",
            ImpactScore::Neutral => "Neutral",
            ImpactScore::Positive => "Positive",
            ImpactScore::VeryPositive => "Very Positive",
        }
    }

    /// Score 0 marks an article with no pillar relevance.
    pub fn is_relevant(self) -> bool {
        self != ImpactScore::Undefined
    }
}

impl fmt::Display for ImpactScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImpactScore {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        if let Ok(score) = wanted.parse::<i64>() {
            return ImpactScore::from_score(score).map_err(|_| {
                Error::InvalidInput(format!("Impact score out of range: {}", score))
            });
        }
        let normalized = wanted.replace(['_', '-'], " ");
        ImpactScore::ALL
            .iter()
            .copied()
            .find(|i| i.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown sentiment: {}", s)))
    }
}

/// Stored as the integer score in the article table.
mod impact_code {
    use super::ImpactScore;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(score: &ImpactScore, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(score.score())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<ImpactScore, D::Error> {
        let raw = i64::deserialize(d)?;
        ImpactScore::from_score(raw).map_err(serde::de::Error::custom)
    }
}

/// Multi-label pillar membership, one flag per `pillar_N` column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarMembership(pub [bool; Pillar::COUNT]);

impl PillarMembership {
    pub fn from_pillars(pillars: &[Pillar]) -> Self {
        let mut flags = [false; Pillar::COUNT];
        for pillar in pillars {
            flags[pillar.index()] = true;
        }
        Self(flags)
    }

    pub fn contains(&self, pillar: Pillar) -> bool {
        self.0[pillar.index()]
    }

    pub fn set(&mut self, pillar: Pillar, member: bool) {
        self.0[pillar.index()] = member;
    }

    /// Membership from per-pillar indicator values. When no indicator is
    /// present at all the article belongs to its associated pillar only.
    pub fn from_indicators(indicators: [Option<bool>; Pillar::COUNT], associated: Pillar) -> Self {
        if indicators.iter().all(Option::is_none) {
            return Self::from_pillars(&[associated]);
        }
        Self(indicators.map(|flag| flag.unwrap_or(false)))
    }
}

/// A `pillar_N` cell: tables store these as 0/1 integers, some exports as booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum Indicator {
    Flag(bool),
    Integer(i64),
    Float(f64),
}

impl Indicator {
    fn is_set(&self) -> bool {
        match *self {
            Indicator::Flag(flag) => flag,
            Indicator::Integer(value) => value > 0,
            Indicator::Float(value) => value > 0.0,
        }
    }
}

/// The eight `pillar_N` columns of a flat article row.
#[derive(Debug, Clone, Copy, Default)]
struct IndicatorColumns([Option<bool>; Pillar::COUNT]);

impl Serialize for IndicatorColumns {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let present = self.0.iter().flatten().count();
        let mut map = s.serialize_map(Some(present))?;
        for pillar in Pillar::ALL {
            if let Some(flag) = self.0[pillar.index()] {
                map.serialize_entry(pillar.column(), &u8::from(flag))?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndicatorColumns {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> serde::de::Visitor<'de> for ColumnsVisitor {
            type Value = IndicatorColumns;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("pillar_N indicator columns")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut columns = IndicatorColumns::default();
                while let Some(key) = map.next_key::<String>()? {
                    match Pillar::ALL.iter().find(|p| p.column() == key) {
                        Some(pillar) => {
                            let value: Option<Indicator> = map.next_value()?;
                            columns.0[pillar.index()] = Some(value.is_some_and(|v| v.is_set()));
                        }
                        None => {
                            map.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(columns)
            }
        }

        d.deserialize_map(ColumnsVisitor)
    }
}

/// Which text column an analysis reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    #[default]
    CleanedText,
    Entities,
}

impl FromStr for TextField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "terms" | "text" | "cleaned_text" => Ok(TextField::CleanedText),
            "entities" => Ok(TextField::Entities),
            other => Err(Error::InvalidInput(format!("Unknown text field: {}", other))),
        }
    }
}

/// One row of a country's article table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArticleRow", into = "ArticleRow")]
pub struct Article {
    pub id: String,
    pub domain_url: String,
    pub link: String,
    pub published_date: NaiveDate,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cleaned_text: String,
    pub entities: String,
    pub impact_score: ImpactScore,
    pub associated_pillar: Pillar,
    pub pillars: PillarMembership,
}

/// Serialized form of [`Article`], keyed by the table's column names.
#[derive(Serialize, Deserialize)]
struct ArticleRow {
    id: String,
    domain_url: String,
    #[serde(default)]
    link: String,
    published_date: NaiveDate,
    title_trans: String,
    #[serde(default)]
    content_trans: String,
    summary: String,
    #[serde(default)]
    cleaned_text: String,
    #[serde(default)]
    entities: String,
    #[serde(with = "impact_code")]
    impact_score: ImpactScore,
    associated_pillar: Pillar,
    #[serde(flatten)]
    indicators: IndicatorColumns,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            pillars: PillarMembership::from_indicators(row.indicators.0, row.associated_pillar),
            id: row.id,
            domain_url: row.domain_url,
            link: row.link,
            published_date: row.published_date,
            title: row.title_trans,
            content: row.content_trans,
            summary: row.summary,
            cleaned_text: row.cleaned_text,
            entities: row.entities,
            impact_score: row.impact_score,
            associated_pillar: row.associated_pillar,
        }
    }
}

impl From<Article> for ArticleRow {
    fn from(article: Article) -> Self {
        Self {
            indicators: IndicatorColumns(article.pillars.0.map(Some)),
            id: article.id,
            domain_url: article.domain_url,
            link: article.link,
            published_date: article.published_date,
            title_trans: article.title,
            content_trans: article.content,
            summary: article.summary,
            cleaned_text: article.cleaned_text,
            entities: article.entities,
            impact_score: article.impact_score,
            associated_pillar: article.associated_pillar,
        }
    }
}

impl Article {
    pub fn week_start(&self) -> NaiveDate {
        week_start(self.published_date)
    }

    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::CleanedText => &self.cleaned_text,
            TextField::Entities => &self.entities,
        }
    }

    pub fn is_relevant(&self) -> bool {
        self.impact_score.is_relevant()
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Keeps the first row seen for every article identifier.
pub fn unique_by_id<'a, I>(articles: I) -> Vec<&'a Article>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.id.as_str()))
        .collect()
}

static BULLET_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\* \*\*").unwrap());
static DOUBLE_INDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n    ").unwrap());
static EMBEDDED_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"## .*\n").unwrap());

/// Normalizes an AI narrative for display: bullet markers, duplicated
/// indentation and embedded `##` headers.
pub fn clean_narrative(text: &str) -> String {
    let text = BULLET_MARKER.replace_all(text, "- **");
    let text = DOUBLE_INDENT.replace_all(&text, "\n\n");
    EMBEDDED_HEADER.replace_all(&text, "").into_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub sentiment: String,
    pub text: String,
}

impl Narrative {
    pub fn cleaned(&self) -> String {
        clean_narrative(&self.text)
    }
}

/// Pillar → sentiment → narrative document produced for each country.
/// Sentiment order follows the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub pillars: BTreeMap<Pillar, Vec<Narrative>>,
}

impl CountrySummary {
    pub fn from_json(raw: &str) -> Result<Self> {
        let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut pillars = BTreeMap::new();

        for (key, sentiments) in document {
            let pillar = match key.parse::<Pillar>() {
                Ok(pillar) => pillar,
                Err(_) => {
                    tracing::warn!("Skipping unknown pillar key in summary document: {}", key);
                    continue;
                }
            };
            let sentiments = sentiments.as_object().ok_or_else(|| {
                Error::InvalidData(format!("Summary entry for {} is not an object", key))
            })?;
            let narratives = sentiments
                .iter()
                .map(|(sentiment, text)| {
                    text.as_str()
                        .map(|t| Narrative {
                            sentiment: sentiment.clone(),
                            text: t.to_string(),
                        })
                        .ok_or_else(|| {
                            Error::InvalidData(format!(
                                "Summary for {} / {} is not text",
                                key, sentiment
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            pillars.insert(pillar, narratives);
        }

        Ok(Self { pillars })
    }

    pub fn narratives(&self, pillar: Pillar) -> &[Narrative] {
        self.pillars.get(&pillar).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.pillars.is_empty()
    }
}

/// Everything loaded for one country. Immutable once read.
#[derive(Debug, Clone)]
pub struct CountryDataset {
    pub country: Country,
    pub articles: Vec<Article>,
    pub summary: CountrySummary,
}

impl CountryDataset {
    pub fn new(country: Country, articles: Vec<Article>, summary: CountrySummary) -> Self {
        Self {
            country,
            articles,
            summary,
        }
    }

    /// Number of distinct article identifiers.
    pub fn article_count(&self) -> usize {
        unique_by_id(&self.articles).len()
    }
}
