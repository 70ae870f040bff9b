//! Semantic search orchestration core of a desktop search daemon.
//!
//! A [`SemanticWorker`] takes free-text query context, waits for input to
//! settle, has the query-language service translate it into structured
//! entities, fans those out to independent search backends in parallel, and
//! ranks what they push into a shared buffer that callers drain with
//! [`SemanticWorker::take_all`].

pub mod backend;
pub mod category;
pub mod config;
pub mod error;
pub mod query;
pub mod worker;

pub use backend::{BackendKind, FileNameBackend, ResultSink, ScoreBoard, SearchBackend};
pub use category::Category;
pub use config::DaemonConfig;
pub use error::{Error, Result};
pub use query::{ClauseParser, EntityParser, HttpTranslator, QueryEntity, QueryTranslation, QueryTranslator, StructuredQuery};
pub use worker::{MatchedItemMap, ResultEntry, SearchEvent, SemanticWorker, WorkerStatus};
