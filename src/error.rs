use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("REPORT_WRITE_FAILED: Cannot write JUnit xml to '{}': {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("METADATA_WRITE_FAILED: Cannot write metadata file '{}': {source}", path.display())]
    MetadataWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("INVALID_EVENT: Line {line}: {reason}")]
    InvalidEvent { line: usize, reason: String },

    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
