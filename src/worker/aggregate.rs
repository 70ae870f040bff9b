//! Post-dispatch ranking: weight, sort, merge extras, truncate.

use crate::worker::buffer::{MatchedItemMap, ResultEntry};

use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Default per-category cap.
pub const DEFAULT_MAX_PER_CATEGORY: usize = 100;

/// Weight table supplied by the backends: identity -> weight.
pub type WeightTable = HashMap<String, f64>;

/// Extras table supplied by the backends: identity -> key/value pairs.
pub type ExtraTable = HashMap<String, Map<String, Value>>;

/// Ranks every category of a buffer in place.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    max_per_category: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_CATEGORY)
    }
}

impl Aggregator {
    pub fn new(max_per_category: usize) -> Self {
        Self { max_per_category }
    }

    /// Full pass over `items`. Callers hold the buffer guard for the duration.
    pub fn aggregate(&self, items: &mut MatchedItemMap, weights: &WeightTable, extras: &ExtraTable) {
        for list in items.values_mut() {
            apply_weights(list, weights);
            rank(list);
            merge_extras(list, extras);
            list.truncate(self.max_per_category);
        }
    }
}

/// Attach the table weight to every entry that has none yet (default `0.0`).
fn apply_weights(list: &mut [ResultEntry], weights: &WeightTable) {
    for entry in list {
        let weight = weights.get(&entry.item).copied().unwrap_or(0.0);
        entry.extra.set_weight_if_absent(weight);
    }
}

/// Stable sort by descending weight, ties by descending display name.
fn rank(list: &mut [ResultEntry]) {
    list.sort_by(compare_ranked);
}

fn compare_ranked(a: &ResultEntry, b: &ResultEntry) -> Ordering {
    b.extra
        .weight()
        .total_cmp(&a.extra.weight())
        .then_with(|| b.name.cmp(&a.name))
}

fn merge_extras(list: &mut [ResultEntry], extras: &ExtraTable) {
    for entry in list {
        if let Some(extra) = extras.get(&entry.item) {
            entry.extra.merge(extra);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn entry(item: &str, name: &str) -> ResultEntry {
        ResultEntry::new(item, name, Category::Document, "test")
    }

    fn names(list: &[ResultEntry]) -> Vec<&str> {
        list.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn ties_break_on_descending_name() {
        let mut items = MatchedItemMap::new();
        items.insert(
            Category::Document,
            vec![entry("/b", "b"), entry("/a", "a"), entry("/c", "c")],
        );
        let weights = WeightTable::from([
            ("/b".to_string(), 3.0),
            ("/a".to_string(), 3.0),
            ("/c".to_string(), 1.0),
        ]);

        Aggregator::default().aggregate(&mut items, &weights, &ExtraTable::new());

        let list = &items[&Category::Document];
        assert_eq!(names(list), vec!["b", "a", "c"]);
        let ranked: Vec<f64> = list.iter().map(|entry| entry.extra.weight()).collect();
        assert_eq!(ranked, vec![3.0, 3.0, 1.0]);
    }

    #[test]
    fn existing_weight_wins_over_table() {
        let mut items = MatchedItemMap::new();
        items.insert(
            Category::Document,
            vec![entry("/x", "x").with_weight(10.0), entry("/y", "y")],
        );
        let weights = WeightTable::from([("/x".to_string(), 1.0), ("/y".to_string(), 5.0)]);

        Aggregator::default().aggregate(&mut items, &weights, &ExtraTable::new());

        let list = &items[&Category::Document];
        assert_eq!(names(list), vec!["x", "y"]);
        assert_eq!(list[0].extra.weight, Some(10.0));
        assert_eq!(list[1].extra.weight, Some(5.0));
    }

    #[test]
    fn missing_weight_defaults_to_zero_and_single_entry_is_weighted() {
        let mut items = MatchedItemMap::new();
        items.insert(Category::Picture, vec![entry("/only", "only")]);

        Aggregator::default().aggregate(&mut items, &WeightTable::new(), &ExtraTable::new());

        assert_eq!(items[&Category::Picture][0].extra.weight, Some(0.0));
    }

    #[test]
    fn extras_merge_with_overwrite() {
        let mut items = MatchedItemMap::new();
        let mut existing = entry("/a", "a");
        existing
            .extra
            .values
            .insert("path".into(), Value::from("stale"));
        items.insert(Category::Document, vec![existing, entry("/b", "b")]);

        let mut extra = Map::new();
        extra.insert("path".into(), Value::from("/srv/a"));
        extra.insert("size".into(), Value::from(42));
        let extras = ExtraTable::from([("/a".to_string(), extra)]);

        Aggregator::default().aggregate(&mut items, &WeightTable::new(), &extras);

        let list = &items[&Category::Document];
        let a = list.iter().find(|entry| entry.item == "/a").unwrap();
        assert_eq!(a.extra.values["path"], Value::from("/srv/a"));
        assert_eq!(a.extra.values["size"], Value::from(42));
        let b = list.iter().find(|entry| entry.item == "/b").unwrap();
        assert!(b.extra.values.is_empty());
    }

    #[test]
    fn truncates_to_highest_ranked_prefix() {
        let mut items = MatchedItemMap::new();
        let list: Vec<_> = (1..=150_u32)
            .map(|i| entry(&format!("/doc/{i}"), &format!("doc{i:03}")))
            .collect();
        let weights: WeightTable = (1..=150_u32)
            .map(|i| (format!("/doc/{i}"), f64::from(i)))
            .collect();
        items.insert(Category::Document, list);
        items.insert(Category::Picture, vec![entry("/p", "p")]);

        Aggregator::default().aggregate(&mut items, &weights, &ExtraTable::new());

        let documents = &items[&Category::Document];
        assert_eq!(documents.len(), 100);
        assert_eq!(documents[0].extra.weight(), 150.0);
        assert_eq!(documents[99].extra.weight(), 51.0);
        assert_eq!(items[&Category::Picture].len(), 1);
    }

    #[test]
    fn small_lists_are_still_sorted() {
        let mut items = MatchedItemMap::new();
        items.insert(
            Category::Document,
            vec![entry("/1", "one"), entry("/2", "two")],
        );
        let weights = WeightTable::from([("/2".to_string(), 2.0)]);

        Aggregator::new(5).aggregate(&mut items, &weights, &ExtraTable::new());

        assert_eq!(names(&items[&Category::Document]), vec!["two", "one"]);
    }

    #[test]
    fn equal_weight_and_name_keep_push_order() {
        let mut items = MatchedItemMap::new();
        items.insert(
            Category::Document,
            vec![
                entry("/1", "same").with_weight(7.0),
                entry("/2", "same").with_weight(7.0),
                entry("/3", "same").with_weight(7.0),
                entry("/low", "same").with_weight(1.0),
            ],
        );

        Aggregator::default().aggregate(&mut items, &WeightTable::new(), &ExtraTable::new());

        let order: Vec<&str> = items[&Category::Document]
            .iter()
            .map(|entry| entry.item.as_str())
            .collect();
        assert_eq!(order, vec!["/1", "/2", "/3", "/low"]);
    }
}
