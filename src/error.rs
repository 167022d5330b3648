use std::path::PathBuf;
use thiserror::Error;

/// Failure to bring a raw listing file into memory. Aborts the run.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read listing source '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed listing source '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("listing source '{}' is missing required columns: {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

#[derive(Error, Debug)]
pub enum RentmapError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to persist dataset to '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geocoding error: {0}")]
    Geocode(String),
}

pub type Result<T> = std::result::Result<T, RentmapError>;
