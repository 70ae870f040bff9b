//! Fan a structured query out to every enlisted backend and wait for all.

use crate::backend::{ResultSink, ScoreBoard, SearchBackend};
use crate::config::EngineConfig;
use crate::query::StructuredQuery;

use std::sync::Arc;
use tokio::task::JoinSet;

/// One backend bound to the run's sink. Lives only for one dispatch.
pub struct BackendTask {
    backend: Arc<dyn SearchBackend>,
    sink: ResultSink,
}

impl BackendTask {
    pub fn new(backend: Arc<dyn SearchBackend>, sink: ResultSink) -> Self {
        Self { backend, sink }
    }

    async fn run(self, query: StructuredQuery, board: Arc<ScoreBoard>) {
        let name = self.backend.name().to_string();
        if let Err(error) = self.backend.run(&query, &self.sink, &board).await {
            tracing::warn!(backend = %name, %error, "backend query failed");
        }
    }
}

/// Bind every backend the toggles enlist to `sink`.
pub fn plan_tasks(
    backends: &[Arc<dyn SearchBackend>],
    engines: &EngineConfig,
    sink: &ResultSink,
) -> Vec<BackendTask> {
    backends
        .iter()
        .filter(|backend| backend.kind().is_enabled(engines))
        .map(|backend| {
            tracing::debug!(backend = backend.name(), kind = %backend.kind(), "added backend to search queue");
            BackendTask::new(backend.clone(), sink.clone())
        })
        .collect()
}

/// Run all tasks concurrently and block until every one has finished.
///
/// Returns the number of tasks that ran to completion without panicking.
pub async fn dispatch(
    tasks: Vec<BackendTask>,
    query: &StructuredQuery,
    board: &Arc<ScoreBoard>,
) -> usize {
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task.run(query.clone(), board.clone()));
    }

    let mut completed = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(()) => completed += 1,
            Err(error) => tracing::warn!(%error, "backend task aborted"),
        }
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use crate::category::Category;
    use crate::error::{Error, Result};
    use crate::query::QueryEntity;
    use crate::worker::buffer::{ResultBuffer, ResultEntry};
    use crate::worker::state::WorkerState;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed {
        name: &'static str,
        kind: BackendKind,
        count: usize,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl SearchBackend for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn run(
            &self,
            _query: &StructuredQuery,
            sink: &ResultSink,
            board: &ScoreBoard,
        ) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(Error::Backend {
                    backend: self.name.into(),
                    message: "index missing".into(),
                });
            }
            for i in 0..self.count {
                let item = format!("/{}/{i}", self.name);
                board.set_weight(&item, i as f64);
                sink.push(vec![ResultEntry::new(item, format!("{i}"), Category::Document, self.name)]);
            }
            board.add_found(self.count);
            Ok(())
        }
    }

    fn backend(name: &'static str, kind: BackendKind, count: usize) -> Arc<dyn SearchBackend> {
        Arc::new(Fixed {
            name,
            kind,
            count,
            delay: Duration::from_millis(10),
            fail: false,
        })
    }

    fn sink() -> (Arc<ResultBuffer>, ResultSink) {
        let buffer = Arc::new(ResultBuffer::new());
        let state = Arc::new(WorkerState::new());
        state.try_start();
        (buffer.clone(), ResultSink::new(buffer, state))
    }

    #[test]
    fn plan_respects_engine_toggles() {
        let backends = vec![
            backend("name", BackendKind::FileName, 0),
            backend("text", BackendKind::FullText, 0),
            backend("feature", BackendKind::Feature, 0),
            backend("vector", BackendKind::Vector, 0),
        ];
        let (_buffer, sink) = sink();

        assert_eq!(plan_tasks(&backends, &EngineConfig::default(), &sink).len(), 4);

        let engines = EngineConfig {
            semantic: true,
            vector: false,
            fulltext: false,
        };
        assert_eq!(plan_tasks(&backends, &engines, &sink).len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn waits_for_every_backend() {
        let backends = vec![
            backend("name", BackendKind::FileName, 30),
            backend("text", BackendKind::FullText, 20),
            Arc::new(Fixed {
                name: "broken",
                kind: BackendKind::Feature,
                count: 5,
                delay: Duration::from_millis(50),
                fail: true,
            }) as Arc<dyn SearchBackend>,
        ];
        let (buffer, sink) = sink();
        let board = Arc::new(ScoreBoard::new());
        let query = StructuredQuery::new(vec![QueryEntity::new("FILE_NAME", "CONTAINS", "x")]);

        let tasks = plan_tasks(&backends, &EngineConfig::default(), &sink);
        let completed = dispatch(tasks, &query, &board).await;

        assert_eq!(completed, 3);
        assert_eq!(buffer.len(Category::Document), 50);
        assert_eq!(board.result_count(), 50);
        assert_eq!(board.weights().len(), 50);
    }
}
