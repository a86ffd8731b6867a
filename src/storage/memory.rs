//! In-memory index sink.

use super::{IndexEntry, IndexSink, StorageResult};
use crate::types::{Category, Location};
use dashmap::DashMap;
use std::collections::BTreeSet;

/// Concurrent in-memory store, one append-ordered bucket per category.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    buckets: DashMap<Category, Vec<IndexEntry>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from previously saved entries, keeping their order.
    pub fn from_entries(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        let index = Self::new();
        for entry in entries {
            index.buckets.entry(entry.category).or_default().push(entry);
        }
        index
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records in one category.
    pub fn count(&self, category: Category) -> usize {
        self.buckets
            .get(&category)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    }

    /// Snapshot of every record, grouped by category in tag order.
    pub fn entries(&self) -> Vec<IndexEntry> {
        Category::ALL
            .iter()
            .filter_map(|category| self.buckets.get(category))
            .flat_map(|bucket| bucket.value().clone())
            .collect()
    }

    /// Distinct locations that currently own at least one record.
    pub fn locations(&self) -> BTreeSet<Location> {
        self.buckets
            .iter()
            .flat_map(|bucket| {
                bucket
                    .value()
                    .iter()
                    .map(|entry| entry.location.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl IndexSink for MemoryIndex {
    fn add_entry(&self, category: Category, value: &str, location: &Location) -> StorageResult<()> {
        self.buckets
            .entry(category)
            .or_default()
            .push(IndexEntry::new(category, value, location.clone()));
        Ok(())
    }

    fn query(&self, category: Category, location: Option<&Location>) -> Vec<IndexEntry> {
        let Some(bucket) = self.buckets.get(&category) else {
            return Vec::new();
        };

        bucket
            .iter()
            .filter(|entry| location.is_none_or(|loc| &entry.location == loc))
            .cloned()
            .collect()
    }

    fn remove_location(&self, location: &Location) -> usize {
        let mut removed = 0;
        for mut bucket in self.buckets.iter_mut() {
            let before = bucket.len();
            bucket.retain(|entry| &entry.location != location);
            removed += before - bucket.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_preserves_append_order() {
        let index = MemoryIndex::new();
        let loc = Location::from("a.js");
        index.add_entry(Category::Type, "first", &loc).unwrap();
        index.add_entry(Category::Type, "second", &loc).unwrap();
        index.add_entry(Category::Function, "other", &loc).unwrap();

        let values: Vec<String> = index
            .query(Category::Type, None)
            .into_iter()
            .map(|e| e.value)
            .collect();
        assert_eq!(values, vec!["first", "second"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.count(Category::Function), 1);
    }

    #[test]
    fn test_query_filters_by_location() {
        let index = MemoryIndex::new();
        let a = Location::from("a.js");
        let b = Location::from("b.js");
        index.add_entry(Category::Description, "0\0from a", &a).unwrap();
        index.add_entry(Category::Description, "0\0from b", &b).unwrap();

        let from_b = index.query(Category::Description, Some(&b));
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].value, "0\0from b");
        assert_eq!(index.query(Category::Description, None).len(), 2);
    }

    #[test]
    fn test_duplicate_values_are_kept() {
        let index = MemoryIndex::new();
        let loc = Location::from("a.js");
        index.add_entry(Category::Type, "Foo\0Object\0-1", &loc).unwrap();
        index.add_entry(Category::Type, "Foo\0Object\0-1", &loc).unwrap();
        assert_eq!(index.count(Category::Type), 2);
    }

    #[test]
    fn test_remove_location() {
        let index = MemoryIndex::new();
        let a = Location::from("a.js");
        let b = Location::from("b.js");
        index.add_entry(Category::Type, "A", &a).unwrap();
        index.add_entry(Category::Property, "p", &a).unwrap();
        index.add_entry(Category::Type, "B", &b).unwrap();

        assert_eq!(index.remove_location(&a), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.locations().into_iter().collect::<Vec<_>>(), vec![b]);
        assert_eq!(index.remove_location(&a), 0);
    }

    #[test]
    fn test_from_entries_round_trip() {
        let index = MemoryIndex::new();
        let loc = Location::from("a.js");
        index.add_entry(Category::Type, "A", &loc).unwrap();
        index.add_entry(Category::UserAgent, "0\0IE\0\0\0", &loc).unwrap();

        let copy = MemoryIndex::from_entries(index.entries());
        assert_eq!(copy.entries(), index.entries());
    }
}
