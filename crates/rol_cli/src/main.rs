use anyhow::Context;
use clap::Parser;
use rol_analysis::{
    aggregate::{dataset_overview, pillar_impact_summary, weekly_summary},
    cooccurrence::cooccurrence,
    default_user_stopwords, media_reports, search, StopWords, TermExtractor, TopicModeller,
    TopicRequest, Weighting,
};
use rol_core::{
    Country, CountryDataset, DashboardConfig, DatasetSource, ImpactScore, Pillar, Result,
    TextField,
};
use rol_web::{create_app, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod logging;
mod output;

use logging::{init_logging, parse_level};
use output::{print_json, print_table};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rule of Law news tracker dashboard", long_about = None)]
pub struct Cli {
    /// Directory holding news-data/ and summaries/
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    #[arg(
        long,
        default_value = "parquet",
        help = "Dataset source. Available sources: parquet (default), memory"
    )]
    source: String,
    /// Where topic visualizations are written
    #[arg(long, default_value = "artifacts")]
    artifacts_dir: PathBuf,
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List countries with an article table
    Countries,
    /// Sources, date range and article count
    Overview { country: Country },
    /// Narrative reports per pillar
    Reports { country: Country },
    /// Articles per pillar and impact level
    Pillars { country: Country },
    /// Articles per week and impact level
    Weekly { country: Country },
    /// Pillar co-occurrence matrix
    Cooccurrence {
        country: Country,
        /// Show column percentages instead of counts
        #[arg(long)]
        percent: bool,
    },
    /// Most frequent terms or entities
    Terms {
        country: Country,
        /// terms or entities
        #[arg(long, default_value = "terms")]
        field: TextField,
        /// Break one pillar down by impact level
        #[arg(long)]
        pillar: Option<Pillar>,
        /// Whitespace-separated words to ignore (defaults depend on the country)
        #[arg(long)]
        stopwords: Option<String>,
        #[arg(long)]
        tfidf: bool,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Fit a topic model for one pillar
    Topics {
        country: Country,
        #[arg(long)]
        pillar: Pillar,
        #[arg(long, default_value_t = 5)]
        topics: usize,
        /// Restrict to these impact levels (repeatable)
        #[arg(long = "sentiment")]
        sentiments: Vec<ImpactScore>,
        #[arg(long)]
        seed: Option<u64>,
        /// HTML output path (defaults to the artifacts directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Search article summaries of one pillar and impact level
    Search {
        country: Country,
        #[arg(long)]
        pillar: Pillar,
        #[arg(long)]
        sentiment: ImpactScore,
        /// Terms are ANDed; use `|` or OR for alternatives
        #[arg(trailing_var_arg = true)]
        query: Vec<String>,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Seconds a session may sit idle before it is dropped
        #[arg(long, default_value_t = 3600)]
        session_ttl: u64,
    },
}

impl Cli {
    fn config(&self) -> DashboardConfig {
        DashboardConfig::new()
            .with_data_dir(&self.data_dir)
            .with_artifacts_dir(&self.artifacts_dir)
            .with_source(&self.source)
    }
}

async fn load(source: &Arc<dyn DatasetSource>, country: Country) -> Result<CountryDataset> {
    let dataset = source.load_dataset(country).await?;
    info!("📰 Loaded {} articles for {}", dataset.articles.len(), country);
    Ok(dataset)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(parse_level(&cli.log_level)?);

    let config = cli.config();
    let source = rol_storage::create_source(&config).await?;
    let json = cli.json;

    match cli.command {
        Commands::Countries => {
            let countries = source.available_countries().await?;
            if json {
                print_json(&countries)?;
            } else {
                for country in countries {
                    println!("{}", country);
                }
            }
        }
        Commands::Overview { country } => {
            let overview = dataset_overview(&load(&source, country).await?);
            if json {
                return print_json(&overview);
            }
            let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
            println!("{}: {} articles", overview.country, overview.article_count);
            println!("From {} to {}", date(overview.earliest), date(overview.latest));
            println!("Sources: {}", overview.sources.join(", "));
        }
        Commands::Reports { country } => {
            let reports = media_reports(&load(&source, country).await?.summary);
            if json {
                return print_json(&reports);
            }
            for pillar in reports {
                println!("## {}: {}", pillar.pillar, pillar.title);
                for report in pillar.reports {
                    println!("### {}\n{}\n", report.sentiment, report.text);
                }
            }
        }
        Commands::Pillars { country } => {
            let rows = pillar_impact_summary(&load(&source, country).await?.articles);
            if json {
                return print_json(&rows);
            }
            let rows: Vec<Vec<String>> = rows
                .iter()
                .map(|r| {
                    vec![
                        r.pillar.to_string(),
                        r.impact.to_string(),
                        r.count.to_string(),
                        format!("{:.1}%", r.share),
                    ]
                })
                .collect();
            print_table(&["Pillar", "Impact", "Articles", "Share"], &rows);
        }
        Commands::Weekly { country } => {
            let summary = weekly_summary(&load(&source, country).await?.articles);
            if json {
                return print_json(&summary);
            }
            let rows: Vec<Vec<String>> = summary
                .rows
                .iter()
                .map(|r| vec![r.week.to_string(), r.impact.to_string(), r.count.to_string()])
                .collect();
            print_table(&["Week", "Impact", "Articles"], &rows);
            if let Some(stats) = summary.stats {
                println!(
                    "\nPeak week {} with {} articles; {} articles per week on average",
                    stats.peak_week, stats.peak_total, stats.mean_display
                );
            }
        }
        Commands::Cooccurrence { country, percent } => {
            let matrix = cooccurrence(&load(&source, country).await?.articles);
            if json {
                return print_json(&matrix);
            }
            let mut headers = vec![""];
            headers.extend(matrix.pillars.iter().map(|p| p.label()));
            let rows: Vec<Vec<String>> = matrix
                .pillars
                .iter()
                .enumerate()
                .map(|(i, pillar)| {
                    let mut row = vec![pillar.label().to_string()];
                    if percent {
                        row.extend(matrix.percentage[i].iter().map(|v| format!("{:.1}", v)));
                    } else {
                        row.extend(matrix.raw[i].iter().map(|v| v.to_string()));
                    }
                    row
                })
                .collect();
            print_table(&headers, &rows);
        }
        Commands::Terms {
            country,
            field,
            pillar,
            stopwords,
            tfidf,
            limit,
        } => {
            let dataset = load(&source, country).await?;
            let stopwords = stopwords.unwrap_or_else(|| default_user_stopwords(country));
            let extractor = TermExtractor::new(field, StopWords::new(&stopwords))
                .with_weighting(Weighting::from_tfidf(tfidf))
                .with_limit(limit.unwrap_or(config.top_terms));

            match pillar {
                None => {
                    let table = extractor.top_terms_by_pillar(&dataset.articles);
                    if json {
                        return print_json(&table);
                    }
                    let headers: Vec<&str> = table.iter().map(|t| t.pillar.label()).collect();
                    print_table(&headers, &transpose(table.into_iter().map(|t| t.terms).collect()));
                }
                Some(pillar) => {
                    let table = extractor.top_terms_by_sentiment(&dataset.articles, pillar);
                    if json {
                        return print_json(&table);
                    }
                    let headers: Vec<&str> = table.iter().map(|t| t.impact.label()).collect();
                    print_table(&headers, &transpose(table.into_iter().map(|t| t.terms).collect()));
                }
            }
        }
        Commands::Topics {
            country,
            pillar,
            topics,
            sentiments,
            seed,
            output,
        } => {
            let dataset = load(&source, country).await?;
            let mut request = TopicRequest::new(pillar, topics).with_sentiments(sentiments);
            request.seed = seed;
            let modeller = TopicModeller::new(config.topic_passes, config.max_topics);
            let report = modeller.fit(&dataset.articles, &request)?;

            if let Some(html) = report.render_html() {
                let path = output.unwrap_or_else(|| {
                    config
                        .artifacts_dir
                        .join(format!("topics-{}-{}.html", country.slug(), pillar.number()))
                });
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, html).await?;
                info!("📊 Topic visualization written to {}", path.display());
            }

            if json {
                return print_json(&report);
            }
            if report.is_empty() {
                println!("No text to model for {} in {}", pillar, country);
            }
            for topic in &report.topics {
                let terms: Vec<String> = topic
                    .top_terms
                    .iter()
                    .map(|t| format!("{:.3}*{}", t.weight, t.term))
                    .collect();
                println!("Topic {}: {}", topic.id + 1, terms.join(" + "));
            }
        }
        Commands::Search {
            country,
            pillar,
            sentiment,
            query,
        } => {
            let dataset = load(&source, country).await?;
            let results = search(&dataset.articles, pillar, sentiment, &query.join(" "))?;
            if json {
                return print_json(&results);
            }
            println!("{} articles found\n", results.count);
            for view in results.results {
                println!("{}\n{} | {} | {}", view.title, view.source, view.date, view.impact);
                println!("{}\n{}\n", view.summary, view.link);
            }
        }
        Commands::Serve {
            host,
            port,
            session_ttl,
        } => {
            let state = AppState::new(config.with_session_ttl_secs(session_ttl), source);
            let app = create_app(state).await;
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("🚀 Dashboard API listening on http://{}", addr);
            axum::serve(listener, app).await.context("HTTP server stopped")?;
        }
    }

    Ok(())
}

/// Columns of terms to table rows, padding short columns with blanks.
fn transpose(columns: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let height = columns.iter().map(Vec::len).max().unwrap_or(0);
    (0..height)
        .map(|i| {
            columns
                .iter()
                .map(|column| column.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose() {
        let rows = transpose(vec![
            vec!["court".to_string(), "judge".to_string()],
            vec![],
            vec!["bribery".to_string()],
        ]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["court", "", "bribery"]);
        assert_eq!(rows[1], vec!["judge", "", ""]);
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "rol",
            "--source",
            "memory",
            "search",
            "Austria",
            "--pillar",
            "Pillar 2",
            "--sentiment",
            "very negative",
            "European",
            "OR",
            "funds",
        ])
        .unwrap();
        assert_eq!(cli.config().source, "memory");
        match cli.command {
            Commands::Search {
                country,
                pillar,
                sentiment,
                query,
            } => {
                assert_eq!(country, Country::Austria);
                assert_eq!(pillar, Pillar::AbsenceOfCorruption);
                assert_eq!(sentiment, ImpactScore::VeryNegative);
                assert_eq!(query.join(" "), "European OR funds");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::try_parse_from(["rol", "serve", "--port", "8080", "--session-ttl", "120"])
            .unwrap();
        match cli.command {
            Commands::Serve {
                host,
                port,
                session_ttl,
            } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(port, 8080);
                assert_eq!(session_ttl, 120);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_topics() {
        let cli = Cli::try_parse_from([
            "rol", "topics", "malta", "--pillar", "3", "--topics", "4", "--sentiment", "Positive",
            "--sentiment", "Neutral",
        ])
        .unwrap();
        match cli.command {
            Commands::Topics {
                country,
                pillar,
                topics,
                sentiments,
                ..
            } => {
                assert_eq!(country, Country::Malta);
                assert_eq!(pillar, Pillar::OpenGovernment);
                assert_eq!(topics, 4);
                assert_eq!(sentiments, vec![ImpactScore::Positive, ImpactScore::Neutral]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
