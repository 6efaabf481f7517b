use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secure randomness unavailable: {0}")]
    Randomness(String),

    #[error("target set is empty after load ({skipped} lines skipped)")]
    EmptyTargetSet { skipped: usize },

    #[error("result log {path}: {source}")]
    Sink {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("worker pool failure: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
