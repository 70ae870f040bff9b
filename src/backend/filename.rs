//! Filename backend: walks configured roots and matches file names against
//! the query's keyword entities.

use crate::backend::{BackendKind, ResultSink, ScoreBoard, SearchBackend};
use crate::category::Category;
use crate::config::FileNameConfig;
use crate::error::{Error, Result};
use crate::query::StructuredQuery;
use crate::worker::buffer::ResultEntry;

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Entity fields whose values must all appear in a matching file name.
const KEYWORD_FIELDS: &[&str] = &["FILE_NAME", "KEYWORD", "CONTENT"];

/// Entity field overriding the configured roots.
const PATH_FIELD: &str = "PATH";

/// Matches pushed to the sink per batch.
const PUSH_BATCH: usize = 64;

const SEARCHER: &str = "semantic.file_name";

/// Matches file names under a set of roots.
#[derive(Debug, Clone)]
pub struct FileNameBackend {
    roots: Vec<PathBuf>,
    max_matches: usize,
    hidden: bool,
}

impl FileNameBackend {
    pub fn new(config: &FileNameConfig) -> Self {
        Self {
            roots: config.roots.clone(),
            max_matches: config.max_matches,
            hidden: config.hidden,
        }
    }

    /// `PATH IS` entities replace the configured roots when present.
    fn roots_for(&self, query: &StructuredQuery) -> Vec<PathBuf> {
        let overrides: Vec<PathBuf> = query
            .values_for(&[PATH_FIELD])
            .map(PathBuf::from)
            .filter(|path| path.is_dir())
            .collect();
        if overrides.is_empty() {
            self.roots.clone()
        } else {
            overrides
        }
    }

    fn walk(
        &self,
        roots: Vec<PathBuf>,
        keywords: Vec<String>,
        sink: &ResultSink,
        board: &ScoreBoard,
    ) -> usize {
        let mut pending = Vec::with_capacity(PUSH_BATCH);
        let mut seen = HashSet::new();
        let mut found = 0;

        for root in roots {
            let walker = ignore::WalkBuilder::new(&root)
                .hidden(!self.hidden)
                .git_ignore(true)
                .build();

            for dent in walker {
                if sink.is_closed() {
                    return found;
                }
                let dent = match dent {
                    Ok(dent) => dent,
                    Err(error) => {
                        tracing::debug!(root = %root.display(), %error, "skipping unreadable entry");
                        continue;
                    }
                };
                if !dent.file_type().is_some_and(|kind| kind.is_file()) {
                    continue;
                }

                let path = dent.path();
                let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                let Some(weight) = name_weight(name, &keywords) else {
                    continue;
                };

                let item = path.to_string_lossy().into_owned();
                if !seen.insert(item.clone()) {
                    continue;
                }
                let size = dent.metadata().ok().map(|metadata| metadata.len());
                pending.push(Match {
                    entry: ResultEntry::new(item, name, Category::Inference, SEARCHER),
                    weight,
                    size,
                });

                let exhausted = found + pending.len() >= self.max_matches;
                if pending.len() >= PUSH_BATCH || exhausted {
                    match flush(&mut pending, sink, board) {
                        Some(accepted) => found += accepted,
                        None => return found,
                    }
                }
                if exhausted {
                    return found;
                }
            }
        }

        found + flush(&mut pending, sink, board).unwrap_or(0)
    }
}

/// One file-name hit waiting for the next batch push.
struct Match {
    entry: ResultEntry,
    weight: f64,
    size: Option<u64>,
}

/// Push the pending batch and record its weights and extras once the sink
/// accepts it. `None` when the sink rejected the batch.
fn flush(pending: &mut Vec<Match>, sink: &ResultSink, board: &ScoreBoard) -> Option<usize> {
    if pending.is_empty() {
        return Some(0);
    }
    let batch = std::mem::take(pending);
    let entries = batch.iter().map(|hit| hit.entry.clone()).collect();
    if !sink.push(entries) {
        return None;
    }

    for hit in &batch {
        let item = hit.entry.item.as_str();
        board.set_weight(item, hit.weight);
        board.set_extra(item, "path", item);
        if let Some(size) = hit.size {
            board.set_extra(item, "size", size);
        }
    }
    Some(batch.len())
}

#[async_trait]
impl SearchBackend for FileNameBackend {
    fn name(&self) -> &str {
        "file_name"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::FileName
    }

    async fn run(
        &self,
        query: &StructuredQuery,
        sink: &ResultSink,
        board: &ScoreBoard,
    ) -> Result<()> {
        let keywords: Vec<String> = query
            .values_for(KEYWORD_FIELDS)
            .map(str::to_lowercase)
            .filter(|keyword| !keyword.is_empty())
            .collect();
        if keywords.is_empty() {
            tracing::debug!("no filename keywords in query");
            return Ok(());
        }

        let roots = self.roots_for(query);
        let backend = self.clone();
        let sink = sink.clone();
        let (found, board_updates) = tokio::task::spawn_blocking(move || {
            let local = ScoreBoard::new();
            let found = backend.walk(roots, keywords, &sink, &local);
            (found, local)
        })
        .await
        .map_err(|error| Error::Backend {
            backend: self.name().to_string(),
            message: error.to_string(),
        })?;

        for (item, weight) in board_updates.weights() {
            board.set_weight(&item, weight);
        }
        for (item, extras) in board_updates.extras() {
            board.merge_extras(&item, extras);
        }
        board.add_found(found);

        tracing::debug!(found, "filename backend finished");
        Ok(())
    }
}

/// Weight in `0..=100`: how much of the name the keywords cover. `None` when
/// any keyword is missing.
fn name_weight(name: &str, keywords: &[String]) -> Option<f64> {
    let lower = name.to_lowercase();
    let mut covered = 0;
    for keyword in keywords {
        if !lower.contains(keyword.as_str()) {
            return None;
        }
        covered += keyword.chars().count();
    }

    let stem_len = Path::new(&lower)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map_or(0, |stem| stem.chars().count())
        .max(1);
    Some((covered as f64 / stem_len as f64).min(1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryEntity;
    use crate::worker::buffer::ResultBuffer;
    use crate::worker::state::WorkerState;
    use std::sync::Arc;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("budget.txt"), "x").unwrap();
        std::fs::write(dir.path().join("Budget Report 2024.odt"), "x").unwrap();
        std::fs::write(dir.path().join("holiday.png"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("old-budget.md"), "x").unwrap();
        dir
    }

    fn backend(root: &Path, max_matches: usize) -> FileNameBackend {
        FileNameBackend::new(&FileNameConfig {
            roots: vec![root.to_path_buf()],
            max_matches,
            hidden: false,
        })
    }

    fn running() -> (Arc<ResultBuffer>, Arc<WorkerState>, ResultSink) {
        let buffer = Arc::new(ResultBuffer::new());
        let state = Arc::new(WorkerState::new());
        state.try_start();
        let sink = ResultSink::new(buffer.clone(), state.clone());
        (buffer, state, sink)
    }

    #[test]
    fn weight_prefers_tighter_names() {
        let keywords = vec!["budget".to_string()];
        assert_eq!(name_weight("budget.txt", &keywords), Some(100.0));
        let loose = name_weight("old-budget.md", &keywords).unwrap();
        assert!(loose < 100.0 && loose > 0.0);
        assert_eq!(name_weight("holiday.png", &keywords), None);
    }

    #[tokio::test]
    async fn matches_all_keywords_case_insensitively() {
        let dir = fixture();
        let (buffer, _state, sink) = running();
        let board = ScoreBoard::new();
        let query = StructuredQuery::new(vec![QueryEntity::new("FILE_NAME", "CONTAINS", "BUDGET")]);

        backend(dir.path(), 100)
            .run(&query, &sink, &board)
            .await
            .expect("run");

        assert_eq!(buffer.len(Category::Inference), 3);
        assert_eq!(board.result_count(), 3);
        let exact = dir.path().join("budget.txt").to_string_lossy().into_owned();
        assert_eq!(board.weights()[&exact], 100.0);
        assert_eq!(board.extras()[&exact]["size"], serde_json::Value::from(1));

        let narrowed = StructuredQuery::new(vec![
            QueryEntity::new("FILE_NAME", "CONTAINS", "budget"),
            QueryEntity::new("KEYWORD", "CONTAINS", "report"),
        ]);
        let (buffer, _state, sink) = running();
        backend(dir.path(), 100)
            .run(&narrowed, &sink, &ScoreBoard::new())
            .await
            .expect("run");
        let drained = buffer.take_all();
        assert_eq!(drained[&Category::Inference].len(), 1);
        assert_eq!(drained[&Category::Inference][0].name, "Budget Report 2024.odt");
    }

    #[tokio::test]
    async fn path_entity_overrides_roots_and_limit_applies() {
        let dir = fixture();
        let (buffer, _state, sink) = running();
        let nested = dir.path().join("nested");
        let query = StructuredQuery::new(vec![
            QueryEntity::new("FILE_NAME", "CONTAINS", "budget"),
            QueryEntity::new("PATH", "IS", nested.to_string_lossy()),
        ]);

        backend(dir.path(), 100)
            .run(&query, &sink, &ScoreBoard::new())
            .await
            .expect("run");
        assert_eq!(buffer.len(Category::Inference), 1);

        let (buffer, _state, sink) = running();
        let query = StructuredQuery::new(vec![QueryEntity::new("FILE_NAME", "CONTAINS", "budget")]);
        backend(dir.path(), 2)
            .run(&query, &sink, &ScoreBoard::new())
            .await
            .expect("run");
        assert_eq!(buffer.len(Category::Inference), 2);
    }

    #[tokio::test]
    async fn no_keywords_or_terminated_pushes_nothing() {
        let dir = fixture();
        let (buffer, state, sink) = running();
        let path_only = StructuredQuery::new(vec![QueryEntity::new("PATH", "IS", "/")]);
        backend(dir.path(), 100)
            .run(&path_only, &sink, &ScoreBoard::new())
            .await
            .expect("run");
        assert!(!buffer.has_results());

        state.terminate();
        let query = StructuredQuery::new(vec![QueryEntity::new("FILE_NAME", "CONTAINS", "budget")]);
        backend(dir.path(), 100)
            .run(&query, &sink, &ScoreBoard::new())
            .await
            .expect("run");
        assert!(!buffer.has_results());
    }

    #[tokio::test]
    async fn overlapping_roots_push_each_file_once() {
        let dir = fixture();
        let (buffer, _state, sink) = running();
        let board = ScoreBoard::new();
        let overlapping = FileNameBackend::new(&FileNameConfig {
            roots: vec![dir.path().to_path_buf(), dir.path().join("nested")],
            max_matches: 100,
            hidden: false,
        });
        let query = StructuredQuery::new(vec![QueryEntity::new("FILE_NAME", "CONTAINS", "budget")]);

        overlapping.run(&query, &sink, &board).await.expect("run");

        assert_eq!(buffer.len(Category::Inference), 3);
        assert_eq!(board.result_count(), 3);
    }

    #[test]
    fn walk_stops_once_the_sink_closes() {
        let dir = fixture();
        let (buffer, state, sink) = running();
        let board = ScoreBoard::new();
        state.terminate();

        let found = backend(dir.path(), 100).walk(
            vec![dir.path().to_path_buf()],
            vec!["budget".to_string()],
            &sink,
            &board,
        );

        assert_eq!(found, 0);
        assert!(!buffer.has_results());
        assert!(board.weights().is_empty());
        assert!(board.extras().is_empty());
    }

    #[test]
    fn rejected_batch_leaves_board_empty() {
        let (buffer, state, sink) = running();
        let board = ScoreBoard::new();
        let mut pending = vec![Match {
            entry: ResultEntry::new("/late", "budget.txt", Category::Inference, SEARCHER),
            weight: 100.0,
            size: Some(1),
        }];
        state.terminate();

        assert_eq!(flush(&mut pending, &sink, &board), None);
        assert!(pending.is_empty());
        assert!(!buffer.has_results());
        assert!(board.weights().is_empty());
    }
}
