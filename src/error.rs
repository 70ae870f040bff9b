//! Crate-wide error type.

use crate::worker::WorkerStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the search daemon core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("backend '{backend}' failed: {message}")]
    Backend { backend: String, message: String },

    /// A checkpoint observed that the run is no longer `Running`.
    #[error("search run cancelled (status: {0:?})")]
    Cancelled(WorkerStatus),
}

/// Failures talking to the query-language service.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("query-language service is not configured")]
    NotConfigured,

    #[error("query-language service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("query-language service returned an empty query")]
    Empty,
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}
