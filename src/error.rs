//! Error type shared by the analysis engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio file: {0}")]
    Unsupported(String),

    #[error("decode: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("audio stream does not report its length")]
    UnknownLength,

    #[error("invalid analysis settings: {0}")]
    InvalidSettings(String),

    #[error("analysis has already been started for this target")]
    AlreadyStarted,

    #[error("analysis worker panicked")]
    WorkerPanicked,

    #[error("PNG: {0}")]
    Png(#[from] png::EncodingError),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
