//! The semantic search worker and its run pipeline.

use crate::backend::{ScoreBoard, SearchBackend};
use crate::category::Category;
use crate::config::{DaemonConfig, EngineConfig};
use crate::error::Result;
use crate::query::QueryTranslation;
use crate::worker::SearchEvent;
use crate::worker::aggregate::Aggregator;
use crate::worker::buffer::{MatchedItemMap, ResultBuffer, ResultSink};
use crate::worker::debounce::DebounceGate;
use crate::worker::dispatch::{dispatch, plan_tasks};
use crate::worker::state::{Checkpoint, WorkerState, WorkerStatus};

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::Instrument as _;
use uuid::Uuid;

/// Capacity of the notification channel; listeners that lag only miss
/// duplicate "results available" signals.
const EVENT_CAPACITY: usize = 16;

/// Orchestrates one semantic search over a set of backends.
///
/// Workers are one-shot: create a new one per query.
pub struct SemanticWorker {
    name: String,
    context: ArcSwap<String>,
    engines: ArcSwap<EngineConfig>,
    state: Arc<WorkerState>,
    buffer: Arc<ResultBuffer>,
    debounce: DebounceGate,
    aggregator: Aggregator,
    translation: QueryTranslation,
    backends: Vec<Arc<dyn SearchBackend>>,
    event_tx: broadcast::Sender<SearchEvent>,
}

impl SemanticWorker {
    pub fn new(
        name: impl Into<String>,
        config: &DaemonConfig,
        translation: QueryTranslation,
        backends: Vec<Arc<dyn SearchBackend>>,
    ) -> Self {
        let name = name.into();
        tracing::debug!(worker = %name, backends = backends.len(), "semantic worker created");

        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name,
            context: ArcSwap::from_pointee(String::new()),
            engines: ArcSwap::from_pointee(config.engines),
            state: Arc::new(WorkerState::new()),
            buffer: Arc::new(ResultBuffer::new()),
            debounce: DebounceGate::from(&config.debounce),
            aggregator: Aggregator::new(config.results.max_per_category),
            translation,
            backends,
            event_tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Query text for the next run. A run already in progress keeps its own.
    pub fn set_context(&self, context: impl Into<String>) {
        let context = context.into();
        tracing::debug!(worker = %self.name, length = context.chars().count(), "setting search context");
        self.context.store(Arc::new(context));
    }

    pub fn context(&self) -> Arc<String> {
        self.context.load_full()
    }

    /// Engine toggles for the next run.
    pub fn set_engine_state(&self, semantic: bool, vector: bool, fulltext: bool) {
        self.engines.store(Arc::new(EngineConfig {
            semantic,
            vector,
            fulltext,
        }));
    }

    pub fn engine_state(&self) -> EngineConfig {
        **self.engines.load()
    }

    /// `run` drives the whole pipeline before returning.
    pub fn is_async(&self) -> bool {
        false
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SearchEvent> {
        self.event_tx.subscribe()
    }

    /// Run the full pipeline.
    ///
    /// Returns `false` when the worker was not `Ready` or the run was
    /// terminated before completing; `true` otherwise, including when
    /// translation was unavailable and no backend ran.
    pub async fn run(&self) -> bool {
        if !self.state.try_start() {
            tracing::warn!(
                worker = %self.name,
                status = ?self.state.status(),
                "failed to start worker, invalid state transition"
            );
            return false;
        }

        let span = tracing::info_span!("semantic_search", worker = %self.name, run_id = %Uuid::new_v4());
        match self.pipeline().instrument(span).await {
            Ok(()) => true,
            Err(error) if error.is_cancelled() => {
                tracing::debug!(worker = %self.name, "semantic search cancelled");
                false
            }
            Err(error) => {
                tracing::warn!(worker = %self.name, %error, "semantic search failed");
                false
            }
        }
    }

    async fn pipeline(&self) -> Result<()> {
        let context = self.context.load_full();
        let engines = self.engine_state();
        let checkpoint = Checkpoint::new(self.state.clone());
        tracing::debug!(context = %context, ?engines, "starting semantic search");

        // Empty section first so listeners can lay out the group early.
        self.buffer.insert_placeholder(Category::Inference);
        self.notify();

        self.debounce.settle(&checkpoint).await?;

        let query = if engines.semantic {
            self.translation
                .structured_query(&context, &checkpoint)
                .await?
        } else {
            None
        };
        checkpoint.ensure_running()?;

        let started = Instant::now();
        let board = Arc::new(ScoreBoard::new());
        if let Some(query) = query {
            let sink = ResultSink::new(self.buffer.clone(), self.state.clone());
            let tasks = plan_tasks(&self.backends, &engines, &sink);
            checkpoint.ensure_running()?;
            dispatch(tasks, &query, &board).await;
        }
        checkpoint.ensure_running()?;

        let weights = board.weights();
        let extras = board.extras();
        self.buffer
            .with_exclusive(|items| self.aggregator.aggregate(items, &weights, &extras));
        checkpoint.ensure_running()?;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            found = board.result_count(),
            "search completed"
        );

        if self.buffer.has_results() {
            self.notify();
        }
        Ok(())
    }

    fn notify(&self) {
        let _ = self.event_tx.send(SearchEvent::ResultsAvailable {
            worker: self.name.clone(),
            categories: self.buffer.categories(),
        });
    }

    /// Request cancellation. Safe from any thread, any number of times.
    pub fn terminate(&self) {
        tracing::debug!(worker = %self.name, "terminating worker");
        self.state.terminate();
    }

    pub fn status(&self) -> WorkerStatus {
        self.state.status()
    }

    pub fn has_results(&self) -> bool {
        self.buffer.has_results()
    }

    /// Move every buffered result out.
    pub fn take_all(&self) -> MatchedItemMap {
        self.buffer.take_all()
    }
}
