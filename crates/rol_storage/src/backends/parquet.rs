use ::arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use ::arrow::compute::cast;
use ::arrow::datatypes::{DataType, Date32Type, Int64Type};
use ::parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use async_trait::async_trait;
use chrono::NaiveDate;
use rol_core::{
    Article, Country, CountrySummary, DashboardConfig, DatasetSource, Error, ImpactScore, Pillar,
    PillarMembership, Result,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use crate::SourceBackend;

/// Reads `<data_dir>/news-data/<Country>_master.parquet.gzip` and
/// `<data_dir>/summaries/<country>.json`.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    data_dir: PathBuf,
}

impl ParquetSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn articles_path(&self, country: Country) -> PathBuf {
        self.data_dir
            .join("news-data")
            .join(format!("{}_master.parquet.gzip", country.name()))
    }

    pub fn summary_path(&self, country: Country) -> PathBuf {
        self.data_dir
            .join("summaries")
            .join(format!("{}.json", country.slug()))
    }
}

#[async_trait]
impl SourceBackend for ParquetSource {
    fn get_error_message() -> &'static str {
        "Parquet data directory should contain news-data/ and summaries/"
    }

    async fn open(config: &DashboardConfig) -> Result<Self> {
        if !config.data_dir.is_dir() {
            return Err(Error::Storage(format!(
                "Data directory not found: {}",
                config.data_dir.display()
            )));
        }
        Ok(Self::new(&config.data_dir))
    }
}

#[async_trait]
impl DatasetSource for ParquetSource {
    fn name(&self) -> &str {
        "parquet"
    }

    async fn load_articles(&self, country: Country) -> Result<Vec<Article>> {
        let path = self.articles_path(country);
        if !path.is_file() {
            return Err(Error::DataUnavailable {
                country: country.to_string(),
                path: path.display().to_string(),
            });
        }

        info!("📰 Reading article table {}", path.display());
        let articles = tokio::task::spawn_blocking(move || read_articles(&path))
            .await
            .map_err(|e| Error::Storage(format!("Article reader task failed: {}", e)))??;
        info!("✨ Loaded {} rows for {}", articles.len(), country);
        Ok(articles)
    }

    async fn load_summary(&self, country: Country) -> Result<CountrySummary> {
        let path = self.summary_path(country);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => CountrySummary::from_json(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("⚠️ No summary document for {} at {}", country, path.display());
                Ok(CountrySummary::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn available_countries(&self) -> Result<Vec<Country>> {
        Ok(Country::ALL
            .iter()
            .copied()
            .filter(|c| self.articles_path(*c).is_file())
            .collect())
    }
}

fn storage_err(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Storage(format!("{}: {}", context, e))
}

/// Decode every row group of an article table.
pub fn read_articles(path: &Path) -> Result<Vec<Article>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| storage_err("Failed to open parquet file", e))?
        .build()
        .map_err(|e| storage_err("Failed to build parquet reader", e))?;

    let mut articles = Vec::new();
    for batch in reader {
        let batch = batch.map_err(|e| storage_err("Failed to read record batch", e))?;
        let offset = articles.len();
        articles.extend(articles_from_batch(&batch, offset)?);
    }
    Ok(articles)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::InvalidData(format!("Missing column: {}", name)))
}

fn strings(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    let casted = cast(array, &DataType::Utf8)
        .map_err(|e| storage_err("Failed to read text column", e))?;
    let values = casted.as_string::<i32>();
    Ok((0..values.len())
        .map(|i| (!values.is_null(i)).then(|| values.value(i).to_string()))
        .collect())
}

fn integers(array: &ArrayRef) -> Result<Vec<Option<i64>>> {
    let casted = cast(array, &DataType::Int64)
        .map_err(|e| storage_err("Failed to read integer column", e))?;
    let values = casted.as_primitive::<Int64Type>();
    Ok((0..values.len())
        .map(|i| (!values.is_null(i)).then(|| values.value(i)))
        .collect())
}

/// Calendar dates from string, date or timestamp columns.
fn dates(array: &ArrayRef) -> Result<Vec<Option<NaiveDate>>> {
    match array.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Dictionary(_, _) => {
            Ok(strings(array)?
                .into_iter()
                .map(|s| s.and_then(|s| parse_date(&s)))
                .collect())
        }
        _ => {
            let casted = cast(array, &DataType::Date32)
                .map_err(|e| storage_err("Failed to read date column", e))?;
            let values = casted.as_primitive::<Date32Type>();
            Ok((0..values.len())
                .map(|i| {
                    if values.is_null(i) {
                        None
                    } else {
                        values.value_as_date(i)
                    }
                })
                .collect())
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn optional_strings(batch: &RecordBatch, name: &str, rows: usize) -> Result<Vec<String>> {
    match batch.column_by_name(name) {
        Some(array) => Ok(strings(array)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect()),
        None => {
            debug!("Column {} absent, using empty text", name);
            Ok(vec![String::new(); rows])
        }
    }
}

fn articles_from_batch(batch: &RecordBatch, offset: usize) -> Result<Vec<Article>> {
    let rows = batch.num_rows();
    let ids = strings(column(batch, "id")?)?;
    let published = dates(column(batch, "published_date")?)?;
    let pillars = strings(column(batch, "associated_pillar")?)?;
    let scores = integers(column(batch, "impact_score")?)?;

    let domains = optional_strings(batch, "domain_url", rows)?;
    let links = optional_strings(batch, "link", rows)?;
    let titles = optional_strings(batch, "title_trans", rows)?;
    let contents = optional_strings(batch, "content_trans", rows)?;
    let summaries = optional_strings(batch, "summary", rows)?;
    let cleaned = optional_strings(batch, "cleaned_text", rows)?;
    let entities = optional_strings(batch, "entities", rows)?;

    let mut indicators: Vec<Option<Vec<Option<i64>>>> = Vec::with_capacity(Pillar::COUNT);
    for pillar in Pillar::ALL {
        indicators.push(match batch.column_by_name(pillar.column()) {
            Some(array) => Some(integers(array)?),
            None => None,
        });
    }
    if indicators.iter().all(Option::is_none) {
        warn!("⚠️ No pillar indicator columns, deriving membership from associated_pillar");
    }

    let invalid = |row_no: usize, id: &str, reason: &dyn std::fmt::Display| {
        Error::InvalidData(format!("Row {} ({}): {}", row_no, id, reason))
    };

    let mut articles = Vec::with_capacity(rows);
    for row in 0..rows {
        let row_no = offset + row;
        let id = ids[row]
            .clone()
            .ok_or_else(|| Error::InvalidData(format!("Row {}: missing id", row_no)))?;
        let published_date = published[row]
            .ok_or_else(|| invalid(row_no, &id, &"missing or invalid published_date"))?;
        let associated_pillar = pillars[row]
            .as_deref()
            .ok_or_else(|| invalid(row_no, &id, &"missing associated_pillar"))?
            .parse::<Pillar>()
            .map_err(|e| invalid(row_no, &id, &e))?;
        let impact_score = ImpactScore::from_score(scores[row].unwrap_or(0))
            .map_err(|e| invalid(row_no, &id, &e))?;

        // A present column with a null cell reads as "not a member".
        let flags = Pillar::ALL.map(|pillar| {
            indicators[pillar.index()]
                .as_ref()
                .map(|values| values[row].unwrap_or(0) > 0)
        });
        let membership = PillarMembership::from_indicators(flags, associated_pillar);

        articles.push(Article {
            id,
            domain_url: domains[row].clone(),
            link: links[row].clone(),
            published_date,
            title: titles[row].clone(),
            content: contents[row].clone(),
            summary: summaries[row].clone(),
            cleaned_text: cleaned[row].clone(),
            entities: entities[row].clone(),
            impact_score,
            associated_pillar,
            pillars: membership,
        });
    }
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::arrow::array::{
        BooleanArray, Date32Array, Float64Array, Int64Array, StringArray, TimestampMillisecondArray,
    };
    use ::arrow::datatypes::{Field, Schema, TimeUnit};
    use ::parquet::arrow::ArrowWriter;
    use std::sync::Arc;

    fn text(values: &[&str]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn write_table(path: &Path, batch: RecordBatch) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    fn sample_batch(with_indicators: bool) -> RecordBatch {
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("domain_url", DataType::Utf8, true),
            Field::new("published_date", DataType::Utf8, true),
            Field::new("title_trans", DataType::Utf8, true),
            Field::new("summary", DataType::Utf8, true),
            Field::new("cleaned_text", DataType::Utf8, true),
            Field::new("impact_score", DataType::Int64, true),
            Field::new("associated_pillar", DataType::Utf8, true),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            text(&["a1", "a2", "a1"]),
            text(&["derstandard.at", "krone.at", "derstandard.at"]),
            text(&["2024-05-06 08:00:00", "2024-05-08", "2024-05-06"]),
            text(&["Court ruling", "Police report", "Court ruling"]),
            text(&["Judges rule on funds", "Police made arrests", "Judges rule on funds"]),
            text(&["court judge fund", "police arrest", "court judge fund"]),
            Arc::new(Int64Array::from(vec![Some(2), None, Some(2)])),
            text(&["Pillar 1", "Pillar 5", "Pillar 8"]),
        ];
        if with_indicators {
            for pillar in Pillar::ALL {
                fields.push(Field::new(pillar.column(), DataType::Int64, true));
                let values = match pillar.number() {
                    1 | 8 => vec![1i64, 0, 1],
                    5 => vec![0i64, 1, 0],
                    _ => vec![0i64, 0, 0],
                };
                columns.push(Arc::new(Int64Array::from(values)));
            }
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap()
    }

    #[tokio::test]
    async fn test_load_articles_from_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParquetSource::new(dir.path());
        write_table(&source.articles_path(Country::Austria), sample_batch(true));

        let articles = source.load_articles(Country::Austria).await.unwrap();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].published_date, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(articles[0].impact_score, ImpactScore::Negative);
        assert_eq!(articles[1].impact_score, ImpactScore::Undefined);
        assert_eq!(articles[2].associated_pillar, Pillar::CriminalJustice);
        assert!(articles[0].pillars.contains(Pillar::CriminalJustice));
        assert!(!articles[0].pillars.contains(Pillar::OrderAndSecurity));
        assert_eq!(articles[0].link, "");

        assert_eq!(source.available_countries().await.unwrap(), vec![Country::Austria]);
    }

    #[tokio::test]
    async fn test_membership_derived_without_indicator_columns() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParquetSource::new(dir.path());
        write_table(&source.articles_path(Country::Malta), sample_batch(false));

        let articles = source.load_articles(Country::Malta).await.unwrap();
        assert!(articles[1].pillars.contains(Pillar::OrderAndSecurity));
        assert!(!articles[1].pillars.contains(Pillar::ConstraintsOnGovernmentPowers));
    }

    #[tokio::test]
    async fn test_date32_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.parquet");
        let schema = Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("published_date", DataType::Date32, true),
            Field::new("impact_score", DataType::Int64, true),
            Field::new("associated_pillar", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                text(&["x"]),
                Arc::new(Date32Array::from(vec![19_723])),
                Arc::new(Int64Array::from(vec![5])),
                text(&["Pillar 2"]),
            ],
        )
        .unwrap();
        write_table(&path, batch);

        let articles = read_articles(&path).unwrap();
        assert_eq!(articles[0].published_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(articles[0].impact_score, ImpactScore::VeryPositive);
    }

    #[tokio::test]
    async fn test_missing_country_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParquetSource::new(dir.path());
        let err = source.load_articles(Country::Sweden).await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { .. }));

        let summary = source.load_summary(Country::Sweden).await.unwrap();
        assert!(summary.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pillar_names_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.parquet");
        let schema = Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("published_date", DataType::Utf8, true),
            Field::new("impact_score", DataType::Int64, true),
            Field::new("associated_pillar", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                text(&["ok", "bad"]),
                text(&["2024-01-01", "2024-01-02"]),
                Arc::new(Int64Array::from(vec![1, 1])),
                text(&["Pillar 2", "Pillar 12"]),
            ],
        )
        .unwrap();
        write_table(&path, batch);

        let err = read_articles(&path).unwrap_err();
        assert!(err.to_string().contains("Row 1 (bad)"));
    }

    #[tokio::test]
    async fn test_boolean_indicators_timestamp_dates_float_scores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.parquet");
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "published_date",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                true,
            ),
            Field::new("impact_score", DataType::Float64, true),
            Field::new("associated_pillar", DataType::Utf8, true),
        ];
        // 2024-01-02 09:30 UTC
        let mut columns: Vec<ArrayRef> = vec![
            text(&["t1"]),
            Arc::new(TimestampMillisecondArray::from(vec![1_704_187_800_000i64])),
            Arc::new(Float64Array::from(vec![3.0])),
            text(&["Pillar 1"]),
        ];
        for pillar in Pillar::ALL {
            fields.push(Field::new(pillar.column(), DataType::Boolean, true));
            let member = matches!(pillar.number(), 1 | 2);
            columns.push(Arc::new(BooleanArray::from(vec![member])));
        }
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).unwrap();
        write_table(&path, batch);

        let articles = read_articles(&path).unwrap();
        assert_eq!(articles[0].published_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(articles[0].impact_score, ImpactScore::Neutral);
        assert!(articles[0].pillars.contains(Pillar::AbsenceOfCorruption));
        assert!(articles[0].pillars.contains(Pillar::ConstraintsOnGovernmentPowers));
        assert!(!articles[0].pillars.contains(Pillar::CriminalJustice));
    }

    #[tokio::test]
    async fn test_load_summary_document() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParquetSource::new(dir.path());
        let path = source.summary_path(Country::Austria);
        assert!(path.ends_with("summaries/austria.json"));

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r###"{"Pillar 3": {"Positive": "## Heading\n* **Access** to records improved"}}"###,
        )
        .unwrap();

        let summary = source.load_summary(Country::Austria).await.unwrap();
        let narratives = summary.narratives(Pillar::OpenGovernment);
        assert_eq!(narratives.len(), 1);
        assert_eq!(narratives[0].sentiment, "Positive");
        assert!(narratives[0].text.contains("Access"));
        assert!(summary.narratives(Pillar::CivilJustice).is_empty());
    }
}
