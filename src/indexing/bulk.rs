//! Parallel indexing of many source documents.
//!
//! Every document gets its own [`IndexWriter`] and therefore its own
//! counters; all writers share one [`UserAgentRegistry`]. A failing document
//! is logged and reported without stopping the others.

use super::registry::UserAgentRegistry;
use super::writer::IndexWriter;
use crate::config::Settings;
use crate::model::{MetadataReader, TypeElement};
use crate::storage::IndexSink;
use crate::types::Location;
use crate::{IndexError, IndexResult};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// The parsed model of one document and where it came from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub location: Location,
    pub types: Vec<TypeElement>,
}

impl SourceDocument {
    pub fn new(location: impl Into<Location>, types: Vec<TypeElement>) -> Self {
        Self {
            location: location.into(),
            types,
        }
    }

    /// Load a JSON metadata document; the location is the canonical file
    /// path, so every spelling of the same file re-indexes one location.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let canonical = path.canonicalize().map_err(|e| IndexError::Load {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut reader = MetadataReader::new();
        reader.load_file(&canonical)?;
        Ok(Self::new(
            canonical.display().to_string(),
            reader.into_types(),
        ))
    }
}

#[derive(Debug, Default)]
pub struct BulkReport {
    pub documents_indexed: usize,
    pub types_written: usize,
    pub failures: Vec<(Location, IndexError)>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct BulkIndexer {
    registry: Arc<UserAgentRegistry>,
    threads: usize,
}

impl BulkIndexer {
    pub fn new(registry: Arc<UserAgentRegistry>, threads: usize) -> Self {
        Self {
            registry,
            threads: threads.max(1),
        }
    }

    pub fn from_settings(registry: Arc<UserAgentRegistry>, settings: &Settings) -> Self {
        Self::new(registry, settings.indexing.parallel_threads)
    }

    pub fn registry(&self) -> &Arc<UserAgentRegistry> {
        &self.registry
    }

    /// Replace a document's records with a fresh encoding of its model.
    ///
    /// Returns the number of types written.
    pub fn index_document(
        &self,
        index: &dyn IndexSink,
        document: &SourceDocument,
    ) -> IndexResult<usize> {
        let removed = index.remove_location(&document.location);
        if removed > 0 {
            tracing::debug!(
                target: "bulk",
                "dropped {removed} stale records for {}",
                document.location
            );
        }

        let mut writer = IndexWriter::new(Arc::clone(&self.registry));
        for type_element in &document.types {
            writer.write_type(index, type_element, &document.location)?;
        }
        Ok(document.types.len())
    }

    /// Index every document, in parallel.
    pub fn index_all(&self, index: &dyn IndexSink, documents: &[SourceDocument]) -> BulkReport {
        let run = || {
            documents
                .par_iter()
                .map(|document| (document, self.index_document(index, document)))
                .collect::<Vec<_>>()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!(target: "bulk", "thread pool unavailable, using global pool: {e}");
                run()
            }
        };

        let mut report = BulkReport::default();
        for (document, result) in results {
            match result {
                Ok(types) => {
                    report.documents_indexed += 1;
                    report.types_written += types;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "bulk",
                        "failed to index {}: {e}",
                        document.location
                    );
                    report.failures.push((document.location.clone(), e));
                }
            }
        }

        tracing::info!(
            target: "bulk",
            "indexed {} documents ({} types), {} failed",
            report.documents_indexed,
            report.types_written,
            report.failures.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyElement, UserAgent};
    use crate::storage::{MemoryIndex, StorageError, StorageResult};
    use crate::types::Category;

    fn document(name: &str, types: &[&str]) -> SourceDocument {
        let ua = UserAgent::new("Firefox", "", "Mozilla", "3.0");
        SourceDocument::new(
            name,
            types
                .iter()
                .map(|t| {
                    TypeElement::new(*t)
                        .with_description(format!("{t} docs"))
                        .with_member(PropertyElement::new("x").with_user_agent(ua.clone()))
                })
                .collect(),
        )
    }

    #[test]
    fn test_index_all_shares_user_agents() {
        let index = MemoryIndex::new();
        let bulk = BulkIndexer::new(Arc::new(UserAgentRegistry::new()), 4);
        let documents: Vec<SourceDocument> = (0..8)
            .map(|i| document(&format!("doc{i}.js"), &["A", "B"]))
            .collect();

        let report = bulk.index_all(&index, &documents);
        assert!(report.is_clean());
        assert_eq!(report.documents_indexed, 8);
        assert_eq!(report.types_written, 16);
        assert_eq!(index.count(Category::UserAgent), 1);
        assert_eq!(index.count(Category::Type), 16);
    }

    #[test]
    fn test_reindex_replaces_document_records() {
        let index = MemoryIndex::new();
        let bulk = BulkIndexer::new(Arc::new(UserAgentRegistry::new()), 1);

        bulk.index_document(&index, &document("doc.js", &["A", "B"])).unwrap();
        bulk.index_document(&index, &document("doc.js", &["C"])).unwrap();

        let types: Vec<String> = index
            .query(Category::Type, None)
            .into_iter()
            .map(|e| e.value)
            .collect();
        assert_eq!(types, vec!["C\0Object\00"]);
        // shared user-agent record survives the re-index
        assert_eq!(index.count(Category::UserAgent), 1);
    }

    /// Sink that refuses writes for one location.
    struct FlakySink {
        inner: MemoryIndex,
        broken: Location,
    }

    impl IndexSink for FlakySink {
        fn add_entry(&self, category: Category, value: &str, location: &Location) -> StorageResult<()> {
            if location == &self.broken {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.add_entry(category, value, location)
        }

        fn query(&self, category: Category, location: Option<&Location>) -> Vec<crate::storage::IndexEntry> {
            self.inner.query(category, location)
        }

        fn remove_location(&self, location: &Location) -> usize {
            self.inner.remove_location(location)
        }
    }

    #[test]
    fn test_failed_document_does_not_stop_others() {
        let sink = FlakySink {
            inner: MemoryIndex::new(),
            broken: Location::from("bad.js"),
        };
        let bulk = BulkIndexer::new(Arc::new(UserAgentRegistry::new()), 2);
        let documents = vec![
            document("good.js", &["A"]),
            document("bad.js", &["B"]),
            document("also-good.js", &["C"]),
        ];

        let report = bulk.index_all(&sink, &documents);
        assert_eq!(report.documents_indexed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, Location::from("bad.js"));
        assert!(matches!(report.failures[0].1, IndexError::Storage(_)));
    }

    #[test]
    fn test_load_uses_canonical_location() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        std::fs::write(&path, r#"{"types": [{"name": "A"}]}"#).unwrap();

        let direct = SourceDocument::load(&path).unwrap();
        let dotted = SourceDocument::load(&temp_dir.path().join(".").join("doc.json")).unwrap();
        assert_eq!(direct.location, dotted.location);
        assert_eq!(direct.types.len(), 1);

        let missing = SourceDocument::load(&temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, IndexError::Load { .. }));
    }
}
