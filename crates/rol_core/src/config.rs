use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime settings shared by the CLI and the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Root holding `news-data/` and `summaries/`
    pub data_dir: PathBuf,
    /// Where transient visualization files are written
    pub artifacts_dir: PathBuf,
    /// Dataset backend name (`parquet` or `memory`)
    pub source: String,
    /// Default cap on distinct terms in frequency tables
    pub top_terms: usize,
    /// Passes over the corpus when fitting a topic model
    pub topic_passes: usize,
    /// Upper bound accepted for the requested topic count
    pub max_topics: usize,
    /// Idle time after which a web session and its artifact are dropped
    pub session_ttl_secs: u64,
}

impl DashboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_session_ttl_secs(mut self, secs: u64) -> Self {
        self.session_ttl_secs = secs;
        self
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            artifacts_dir: PathBuf::from("artifacts"),
            source: "parquet".to_string(),
            top_terms: 25,
            topic_passes: 15,
            max_topics: 15,
            session_ttl_secs: 3600,
        }
    }
}
