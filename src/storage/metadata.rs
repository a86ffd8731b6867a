//! Metadata tracking for a persisted index

use super::{MemoryIndex, StorageError, StorageResult};
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const METADATA_FILE: &str = "index.meta";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Metadata about the index state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Version of the record file format
    pub version: u32,

    /// Records per category tag
    pub record_counts: BTreeMap<String, usize>,

    /// Number of distinct locations with records
    pub location_count: usize,

    /// Last modification timestamp
    pub last_modified: u64,
}

pub fn get_utc_timestamp() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

impl IndexMetadata {
    /// Create new metadata for a fresh index
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            record_counts: BTreeMap::new(),
            location_count: 0,
            last_modified: get_utc_timestamp(),
        }
    }

    /// Update counts from the index
    pub fn update_counts(&mut self, index: &MemoryIndex) {
        self.record_counts = Category::ALL
            .iter()
            .map(|category| (category.tag().to_string(), index.count(*category)))
            .collect();
        self.location_count = index.locations().len();
        self.last_modified = get_utc_timestamp();
    }

    pub fn total_records(&self) -> usize {
        self.record_counts.values().sum()
    }

    /// Save metadata to file
    pub fn save(&self, base_path: &Path) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(base_path.join(METADATA_FILE), json)?;
        Ok(())
    }

    /// Load metadata from file
    pub fn load(base_path: &Path) -> StorageResult<Self> {
        let metadata_path = base_path.join(METADATA_FILE);

        if !metadata_path.exists() {
            return Ok(Self::new());
        }

        let json = fs::read_to_string(&metadata_path)?;
        let metadata: Self = serde_json::from_str(&json)
            .map_err(|e| StorageError::Metadata(format!("Failed to parse metadata: {e}")))?;

        if metadata.version != FORMAT_VERSION {
            return Err(StorageError::Metadata(format!(
                "Unsupported index format version {} (expected {FORMAT_VERSION})",
                metadata.version
            )));
        }

        Ok(metadata)
    }
}

impl Default for IndexMetadata {
    fn default() -> Self {
        Self::new()
    }
}
