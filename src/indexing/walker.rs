//! File system walker for discovering metadata documents to index
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules
//! - Custom ignore patterns from configuration
//! - Hidden file handling

use crate::Settings;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extension of metadata documents.
pub const DOCUMENT_EXTENSION: &str = "json";

/// Walks directories to find metadata documents
pub struct DocumentWalker {
    settings: Arc<Settings>,
}

impl DocumentWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Every metadata document under `root`, sorted by path.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false)
            .add_custom_ignore_filename(".symdexignore");

        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &self.settings.indexing.ignore_patterns {
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                tracing::warn!(target: "bulk", "invalid ignore pattern '{pattern}': {e}");
            }
        }
        if let Ok(overrides) = override_builder.build() {
            builder.overrides(overrides);
        }

        let mut documents: Vec<PathBuf> = builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
            })
            .collect();
        documents.sort();
        documents
    }
}
