use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunningTotal {
    pub additions: u64,
    pub deletions: u64,
    /// Distinct commits that contributed to the key, not file changes.
    pub commits: u64,
}

/// Running totals keyed by aggregation key, iterated in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateTable<K: Ord> {
    entries: BTreeMap<K, RunningTotal>,
}

impl<K: Ord> Default for AggregateTable<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord> AggregateTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&RunningTotal> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, K, RunningTotal> {
        self.entries.iter()
    }

    pub(crate) fn total_mut(&mut self, key: K) -> &mut RunningTotal {
        self.entries.entry(key).or_default()
    }

    /// Entries ordered by `metric` descending. The sort is stable, so ties
    /// keep key order and the ranking is the same on every run.
    pub fn ranked_by<F>(&self, metric: F) -> Vec<(&K, &RunningTotal)>
    where
        F: Fn(&RunningTotal) -> u64,
    {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|a, b| metric(b.1).cmp(&metric(a.1)));
        ranked
    }
}

impl<K: Ord> IntoIterator for AggregateTable<K> {
    type Item = (K, RunningTotal);
    type IntoIter = btree_map::IntoIter<K, RunningTotal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K: Ord> IntoIterator for &'a AggregateTable<K> {
    type Item = (&'a K, &'a RunningTotal);
    type IntoIter = btree_map::Iter<'a, K, RunningTotal>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
