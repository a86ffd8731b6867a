//! Persistence for the in-memory index
//!
//! Records are written as JSON lines in append order so a reloaded index
//! answers queries exactly like the one that was saved.

use super::{IndexEntry, IndexMetadata, MemoryIndex, StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const RECORDS_FILE: &str = "records.jsonl";

/// Manages persistence of the index
#[derive(Debug)]
pub struct IndexPersistence {
    base_path: PathBuf,
}

impl IndexPersistence {
    /// Create a new persistence manager
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save every record plus refreshed metadata
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub fn save(&self, index: &MemoryIndex) -> StorageResult<IndexMetadata> {
        fs::create_dir_all(&self.base_path)?;

        let records_path = self.base_path.join(RECORDS_FILE);
        let mut writer = BufWriter::new(File::create(&records_path)?);
        for entry in index.entries() {
            serde_json::to_writer(&mut writer, &entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        let mut metadata = IndexMetadata::load(&self.base_path).unwrap_or_default();
        metadata.update_counts(index);
        metadata.save(&self.base_path)?;

        tracing::debug!(
            target: "storage",
            "saved {} records to {}",
            metadata.total_records(),
            records_path.display()
        );
        Ok(metadata)
    }

    /// Load the index from disk
    #[must_use = "Load errors should be handled appropriately"]
    pub fn load(&self) -> StorageResult<MemoryIndex> {
        let records_path = self.base_path.join(RECORDS_FILE);
        if !records_path.exists() {
            return Err(StorageError::NotFound(records_path.display().to_string()));
        }

        let metadata = IndexMetadata::load(&self.base_path)?;
        let reader = BufReader::new(File::open(&records_path)?);
        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: IndexEntry =
                serde_json::from_str(&line).map_err(|e| StorageError::CorruptRecord {
                    line: line_no + 1,
                    reason: e.to_string(),
                })?;
            entries.push(entry);
        }

        let index = MemoryIndex::from_entries(entries);
        if index.len() != metadata.total_records() && metadata.total_records() > 0 {
            tracing::warn!(
                target: "storage",
                "record count mismatch: metadata says {}, file has {}",
                metadata.total_records(),
                index.len()
            );
        }
        Ok(index)
    }

    /// Check if an index exists
    pub fn exists(&self) -> bool {
        self.base_path.join(RECORDS_FILE).exists()
    }

    /// Delete the persisted index
    pub fn clear(&self) -> Result<(), std::io::Error> {
        for file in [RECORDS_FILE, super::metadata::METADATA_FILE] {
            let path = self.base_path.join(file);
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
