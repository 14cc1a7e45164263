use std::path::PathBuf;

use thiserror::Error;

/// Failures reported to the user by name rather than as a bare anyhow chain.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Ticker symbol not passed")]
    MissingTicker,
    #[error("Output directory {0} does not exist")]
    OutputDirMissing(PathBuf),
    #[error("Output path {0} exists but is not a directory")]
    OutputDirNotADirectory(PathBuf),
    #[error("Batch size must be at least 1")]
    InvalidBatchSize,
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
}
