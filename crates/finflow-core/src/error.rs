//! Error types for FinFlow

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A raw row is missing a required field. The row is dropped.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// The external classifier failed for one batch. The batch degrades to "Other".
    #[error("Classification batch {batch} failed: {reason}")]
    ClassificationBatch { batch: usize, reason: String },

    /// Amount is not a finite decimal after cleanup.
    #[error("Malformed amount: {0}")]
    MalformedAmount(String),

    /// Date does not parse in any supported format.
    #[error("Unparsable date: {0}")]
    UnparsableDate(String),

    /// The input collection as a whole has the wrong shape. Fatal.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
