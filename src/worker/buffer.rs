//! Shared result buffer: category -> ordered result entries.

use crate::category::Category;
use crate::worker::state::WorkerState;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Drained buffer contents.
pub type MatchedItemMap = BTreeMap<Category, Vec<ResultEntry>>;

/// Per-entry metadata: the rank weight plus backend-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemExtra {
    pub weight: Option<f64>,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl ItemExtra {
    /// Attach `weight` unless one is already present. Returns the effective weight.
    pub fn set_weight_if_absent(&mut self, weight: f64) -> f64 {
        *self.weight.get_or_insert(weight)
    }

    /// Effective weight, `0.0` when unset.
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    /// Merge `extra` in, overwriting existing keys.
    pub fn merge(&mut self, extra: &Map<String, Value>) {
        for (key, value) in extra {
            self.values.insert(key.clone(), value.clone());
        }
    }
}

/// One matched item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Identity key, usually an absolute path.
    pub item: String,
    /// Display name.
    pub name: String,
    pub category: Category,
    /// Name of the backend that found the item.
    pub searcher: String,
    pub extra: ItemExtra,
}

impl ResultEntry {
    pub fn new(
        item: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        searcher: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            name: name.into(),
            category,
            searcher: searcher.into(),
            extra: ItemExtra::default(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.extra.weight = Some(weight);
        self
    }
}

/// Mutex-guarded category map written by many backend tasks.
#[derive(Debug, Default)]
pub struct ResultBuffer {
    items: Mutex<MatchedItemMap>,
}

impl ResultBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a (possibly empty) section so listeners can pre-render it.
    pub fn insert_placeholder(&self, category: Category) {
        self.items.lock().entry(category).or_default();
    }

    /// Append entries to their categories in one critical section.
    pub fn append(&self, entries: Vec<ResultEntry>) {
        let mut items = self.items.lock();
        Self::append_locked(&mut items, entries);
    }

    fn append_locked(items: &mut MatchedItemMap, entries: Vec<ResultEntry>) {
        for entry in entries {
            items.entry(entry.category).or_default().push(entry);
        }
    }

    /// Run `f` with the buffer held exclusively for its whole duration.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut MatchedItemMap) -> R) -> R {
        let mut items = self.items.lock();
        f(&mut items)
    }

    pub fn has_results(&self) -> bool {
        !self.items.lock().is_empty()
    }

    /// Categories currently present, including empty placeholders.
    pub fn categories(&self) -> Vec<Category> {
        self.items.lock().keys().copied().collect()
    }

    /// Number of entries in `category`.
    pub fn len(&self, category: Category) -> usize {
        self.items.lock().get(&category).map_or(0, Vec::len)
    }

    /// Move everything out, leaving the buffer empty.
    pub fn take_all(&self) -> MatchedItemMap {
        std::mem::take(&mut *self.items.lock())
    }
}

/// Push callback handed to every backend task of a run.
#[derive(Debug, Clone)]
pub struct ResultSink {
    buffer: Arc<ResultBuffer>,
    state: Arc<WorkerState>,
}

impl ResultSink {
    pub fn new(buffer: Arc<ResultBuffer>, state: Arc<WorkerState>) -> Self {
        Self { buffer, state }
    }

    /// Append `entries` unless the run has been terminated.
    ///
    /// Returns `false` and leaves the buffer unchanged after termination. The
    /// status is read under the buffer lock, so a push either fully lands
    /// before termination is observed or not at all.
    pub fn push(&self, entries: Vec<ResultEntry>) -> bool {
        if entries.is_empty() {
            return !self.state.is_terminated();
        }

        let mut items = self.buffer.items.lock();
        if self.state.is_terminated() {
            tracing::debug!("worker terminated, skipping item push");
            return false;
        }
        ResultBuffer::append_locked(&mut items, entries);
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_terminated()
    }
}
