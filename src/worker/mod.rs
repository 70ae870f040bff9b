//! Semantic search worker: one orchestration run per query.
//!
//! A run moves `Ready -> Running`, reserves the inference section, waits out
//! the debounce interval, translates the query, fans it out to the enlisted
//! backends, ranks what they pushed and announces the results. `terminate()`
//! may be called from any thread; every stage checks for it.

pub mod aggregate;
pub mod buffer;
pub mod debounce;
pub mod dispatch;
pub mod semantic;
pub mod state;

pub use aggregate::{Aggregator, ExtraTable, WeightTable};
pub use buffer::{ItemExtra, MatchedItemMap, ResultBuffer, ResultEntry, ResultSink};
pub use debounce::DebounceGate;
pub use semantic::SemanticWorker;
pub use state::{Checkpoint, WorkerState, WorkerStatus};

use crate::category::Category;

use serde::Serialize;

/// Notifications a worker broadcasts to its listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// New results can be drained with `take_all`. `categories` lists every
    /// section currently in the buffer, including empty placeholders.
    ResultsAvailable {
        worker: String,
        categories: Vec<Category>,
    },
}
