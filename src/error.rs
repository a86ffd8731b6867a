//! Error types for encoding and decoding the flat index.
//!
//! Load failures stop a document before any record is written. Decode
//! failures are scoped to one symbol so the caller can skip it and keep
//! reading the rest of the category.

use crate::storage::StorageError;
use crate::types::{Category, Location};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to load metadata from {source_name}: {reason}")]
    Load { source_name: String, reason: String },

    #[error("Malformed {category} record {value:?}: {reason}")]
    MalformedRecord {
        category: Category,
        value: String,
        reason: String,
    },

    #[error("No {category} record with key {key} at '{location}'")]
    MissingReference {
        category: Category,
        key: String,
        location: Location,
    },

    #[error("{category} sequence exhausted")]
    SequenceExhausted { category: Category },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IndexError {
    pub fn malformed(category: Category, value: &str, reason: impl Into<String>) -> Self {
        IndexError::MalformedRecord {
            category,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(category: Category, key: &str, location: &Location) -> Self {
        IndexError::MissingReference {
            category,
            key: key.to_string(),
            location: location.clone(),
        }
    }

    /// True for failures that only affect the symbol being decoded.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            IndexError::MalformedRecord { .. } | IndexError::MissingReference { .. }
        )
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
