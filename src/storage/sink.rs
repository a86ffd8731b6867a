//! The index sink contract the codec writes to and reads from.

use super::StorageResult;
use crate::types::{Category, Location};
use serde::{Deserialize, Serialize};

/// One flat record: a delimited value filed under a category and location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub category: Category,
    pub value: String,
    pub location: Location,
}

impl IndexEntry {
    pub fn new(category: Category, value: impl Into<String>, location: Location) -> Self {
        Self {
            category,
            value: value.into(),
            location,
        }
    }
}

/// Append-only category/value/location store.
///
/// Implementations must accept appends from several writers at once. There
/// is no uniqueness enforcement: adding the same value twice stores it twice.
pub trait IndexSink: Send + Sync {
    /// Append one record.
    fn add_entry(&self, category: Category, value: &str, location: &Location) -> StorageResult<()>;

    /// All records of a category in append order, optionally restricted to
    /// one location.
    fn query(&self, category: Category, location: Option<&Location>) -> Vec<IndexEntry>;

    /// Drop every record filed under `location`, returning how many went.
    fn remove_location(&self, location: &Location) -> usize;
}
