//! Search backends and the contract the dispatcher drives them through.
//!
//! A backend receives the run's structured query, pushes matches through a
//! [`ResultSink`] as it finds them, and records rank weights and extra
//! metadata on the shared [`ScoreBoard`] for the aggregation pass.

pub mod filename;
pub mod score;

pub use crate::worker::buffer::ResultSink;
pub use filename::FileNameBackend;
pub use score::ScoreBoard;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::query::StructuredQuery;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which engine a backend belongs to; decides whether it is enlisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Filename index.
    FileName,
    /// Full-text index.
    FullText,
    /// Feature index.
    Feature,
    /// Vector similarity index.
    Vector,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::FileName => "file_name",
            BackendKind::FullText => "full_text",
            BackendKind::Feature => "feature",
            BackendKind::Vector => "vector",
        }
    }

    /// Whether a backend of this kind takes part in a run with a structured
    /// query under the given engine toggles.
    pub fn is_enabled(&self, engines: &EngineConfig) -> bool {
        match self {
            BackendKind::FileName | BackendKind::Feature => true,
            BackendKind::FullText => engines.fulltext,
            BackendKind::Vector => engines.vector,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A search engine the worker fans a structured query out to.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Run the query to completion, pushing matches into `sink`.
    ///
    /// Finding nothing is not an error. Once `sink.push` returns `false` the
    /// run was terminated and the backend should stop early.
    async fn run(&self, query: &StructuredQuery, sink: &ResultSink, board: &ScoreBoard)
    -> Result<()>;
}
