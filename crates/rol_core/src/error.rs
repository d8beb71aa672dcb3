use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Data unavailable for {country}: {path}")]
    DataUnavailable { country: String, path: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for errors caused by what the user asked for rather than by the data or the host.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::InvalidQuery(_) | Error::SessionNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
