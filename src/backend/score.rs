//! Weights and extra metadata recorded by backends during a run.

use crate::worker::aggregate::{ExtraTable, WeightTable};

use parking_lot::Mutex;
use serde_json::{Map, Value};

#[derive(Debug, Default)]
struct Tables {
    weights: WeightTable,
    extras: ExtraTable,
    found: usize,
}

/// Shared by every backend task of one run; read once by the aggregator.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    tables: Mutex<Tables>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a weight for `item`. When several backends weigh the same item
    /// the highest weight is kept.
    pub fn set_weight(&self, item: &str, weight: f64) {
        let mut tables = self.tables.lock();
        tables
            .weights
            .entry(item.to_string())
            .and_modify(|existing| *existing = existing.max(weight))
            .or_insert(weight);
    }

    /// Record one extra key/value for `item`, overwriting an earlier value.
    pub fn set_extra(&self, item: &str, key: impl Into<String>, value: impl Into<Value>) {
        let mut tables = self.tables.lock();
        tables
            .extras
            .entry(item.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Merge a batch of extras for `item`.
    pub fn merge_extras(&self, item: &str, extras: Map<String, Value>) {
        let mut tables = self.tables.lock();
        tables
            .extras
            .entry(item.to_string())
            .or_default()
            .extend(extras);
    }

    /// Count results a backend reported, for run statistics.
    pub fn add_found(&self, count: usize) {
        self.tables.lock().found += count;
    }

    pub fn result_count(&self) -> usize {
        self.tables.lock().found
    }

    pub fn weights(&self) -> WeightTable {
        self.tables.lock().weights.clone()
    }

    pub fn extras(&self) -> ExtraTable {
        self.tables.lock().extras.clone()
    }
}
