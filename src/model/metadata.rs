//! Loading of built-in platform metadata.
//!
//! Metadata documents are JSON:
//!
//! ```json
//! {
//!   "types": [
//!     {
//!       "name": "Array",
//!       "description": "An ordered list of values.",
//!       "members": [
//!         { "kind": "property", "name": "length", "types": [{ "type": "Number" }] },
//!         { "kind": "function", "name": "push", "parameters": [
//!             { "name": "items", "usage": "one-or-more", "types": ["Object"] }
//!         ] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A document is parsed and checked completely before any of its types
//! become visible, so a malformed document never yields a partial model.

use super::TypeElement;
use crate::{IndexError, IndexResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub types: Vec<TypeElement>,
}

/// Accumulates types from one or more metadata documents.
#[derive(Debug, Default)]
pub struct MetadataReader {
    types: Vec<TypeElement>,
}

impl MetadataReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types loaded so far, in document order.
    pub fn types(&self) -> &[TypeElement] {
        &self.types
    }

    pub fn into_types(self) -> Vec<TypeElement> {
        self.types
    }

    pub fn load_str(&mut self, json: &str) -> IndexResult<usize> {
        self.load_json(json.as_bytes(), "<string>")
    }

    pub fn load_file(&mut self, path: &Path) -> IndexResult<usize> {
        let file = File::open(path).map_err(|e| IndexError::Load {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.load_json(BufReader::new(file), &path.display().to_string())
    }

    /// Parse one metadata document and append its types.
    ///
    /// Returns the number of types added.
    pub fn load_json<R: Read>(&mut self, source: R, source_name: &str) -> IndexResult<usize> {
        let load_error = |reason: String| IndexError::Load {
            source_name: source_name.to_string(),
            reason,
        };

        let document: MetadataDocument =
            serde_json::from_reader(source).map_err(|e| load_error(e.to_string()))?;
        let types = prepare_types(document.types).map_err(load_error)?;

        let added = types.len();
        tracing::debug!(target: "metadata", "loaded {added} types from {source_name}");
        self.types.extend(types);
        Ok(added)
    }
}

/// Check names and claim members for their declaring type.
fn prepare_types(types: Vec<TypeElement>) -> Result<Vec<TypeElement>, String> {
    let mut prepared = Vec::with_capacity(types.len());

    for (position, mut type_element) in types.into_iter().enumerate() {
        if type_element.name.trim().is_empty() {
            return Err(format!("type #{position} has no name"));
        }

        let members = std::mem::take(&mut type_element.members);
        for member in members {
            if member.name().trim().is_empty() {
                return Err(format!("type {} has a member without a name", type_element.name));
            }
            type_element.add_member(member);
        }

        prepared.push(type_element);
    }

    Ok(prepared)
}
