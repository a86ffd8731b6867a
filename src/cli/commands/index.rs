//! Index and IndexDocs commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::config::Settings;
use crate::indexing::{BulkIndexer, DocumentWalker, IndexWriter, SourceDocument, UserAgentRegistry};
use crate::storage::{IndexPersistence, MemoryIndex};
use crate::{debug_event, log_event};

/// Run index command - encode built-in metadata files into a fresh index.
///
/// User agent records live at the metadata location, so an existing index is
/// only replaced with `--force`.
pub fn run_index(
    settings: &Settings,
    index_path: &Path,
    files: &[PathBuf],
    force: bool,
) -> anyhow::Result<()> {
    let persistence = IndexPersistence::new(index_path);
    if persistence.exists() && !force {
        anyhow::bail!(
            "Index already exists at: {}\nUse --force to rebuild it",
            index_path.display()
        );
    }

    let files: Vec<PathBuf> = if files.is_empty() {
        settings.metadata_file_paths()
    } else {
        files.to_vec()
    };
    if files.is_empty() {
        anyhow::bail!("No metadata files given and indexing.metadata_files is empty");
    }

    let start = Instant::now();
    let registry = Arc::new(UserAgentRegistry::new());
    let mut writer = IndexWriter::new(Arc::clone(&registry));
    for file in &files {
        let loaded = writer
            .load_metadata(file)
            .with_context(|| format!("loading {}", file.display()))?;
        debug_event!("cli", "loaded", "{loaded} types from {}", file.display());
    }

    let index = MemoryIndex::new();
    let written = writer.write_to_index(&index)?;

    if force && persistence.exists() {
        persistence
            .clear()
            .with_context(|| format!("clearing {}", index_path.display()))?;
    }
    let metadata = persistence.save(&index)?;

    log_event!(
        "cli",
        "indexed",
        "{written} types, {} records in {:?}",
        metadata.total_records(),
        start.elapsed()
    );
    println!(
        "Indexed {written} types from {} file(s): {} records, {} user agents",
        files.len(),
        metadata.total_records(),
        registry.len()
    );
    Ok(())
}

/// Run index-docs command - index every document under `dir` in parallel.
///
/// Documents are added to the existing index; each one replaces the records
/// previously stored at its own location.
pub fn run_index_docs(
    settings: Arc<Settings>,
    index_path: &Path,
    dir: &Path,
    threads: Option<usize>,
) -> anyhow::Result<()> {
    let persistence = IndexPersistence::new(index_path);
    let index = if persistence.exists() {
        persistence
            .load()
            .with_context(|| format!("loading index at {}", index_path.display()))?
    } else {
        MemoryIndex::new()
    };

    let registry = Arc::new(UserAgentRegistry::from_index(&index)?);
    let threads = threads.unwrap_or(settings.indexing.parallel_threads);
    let indexer = BulkIndexer::new(Arc::clone(&registry), threads);

    let paths = DocumentWalker::new(Arc::clone(&settings)).walk(dir);
    if paths.is_empty() {
        println!("No metadata documents found under {}", dir.display());
        return Ok(());
    }

    let mut documents = Vec::with_capacity(paths.len());
    let mut load_failures = 0usize;
    for path in &paths {
        match SourceDocument::load(path) {
            Ok(document) => documents.push(document),
            Err(e) => {
                load_failures += 1;
                eprintln!("Skipping {}: {e}", path.display());
            }
        }
    }

    let start = Instant::now();
    let report = indexer.index_all(&index, &documents);
    for (location, error) in &report.failures {
        eprintln!("Failed to index {location}: {error}");
    }

    let metadata = persistence.save(&index)?;
    log_event!(
        "cli",
        "bulk indexed",
        "{} documents in {:?} on {threads} threads",
        report.documents_indexed,
        start.elapsed()
    );
    println!(
        "Indexed {} of {} documents ({} types), {} records across {} locations",
        report.documents_indexed,
        paths.len(),
        report.types_written,
        metadata.total_records(),
        metadata.location_count
    );

    let failed = load_failures + report.failures.len();
    if failed > 0 {
        anyhow::bail!("{failed} document(s) could not be indexed");
    }
    Ok(())
}
