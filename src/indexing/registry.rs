//! Shared user-agent dedup table.
//!
//! Descriptors are interned once per registry lifetime. The first sighting
//! assigns the next key and writes one `user_agent` record at the metadata
//! location; later sightings, from any document or thread, reuse the key.

use super::constants::metadata_location;
use super::records::{FlatRecord, UserAgentRecord};
use crate::IndexResult;
use crate::model::UserAgent;
use crate::storage::IndexSink;
use crate::types::{Category, Location};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Tables {
    keys_by_user_agent: HashMap<UserAgent, String>,
    user_agents_by_key: HashMap<String, UserAgent>,
}

/// Registry handle shared by every writer of one indexing session.
#[derive(Debug)]
pub struct UserAgentRegistry {
    tables: Mutex<Tables>,
    location: Location,
}

impl UserAgentRegistry {
    pub fn new() -> Self {
        Self::with_location(metadata_location())
    }

    /// Registry that files its records under `location`.
    pub fn with_location(location: Location) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            location,
        }
    }

    /// Rebuild the tables from user-agent records already in `index`, so
    /// keys handed out before a reload stay valid.
    pub fn from_index(index: &dyn IndexSink) -> IndexResult<Self> {
        let registry = Self::new();
        {
            let mut tables = registry.tables.lock();
            for entry in index.query(Category::UserAgent, Some(&registry.location)) {
                let record = UserAgentRecord::decode(&entry.value)?;
                tables
                    .keys_by_user_agent
                    .entry(record.user_agent.clone())
                    .or_insert_with(|| record.key.clone());
                tables.user_agents_by_key.insert(record.key, record.user_agent);
            }
            tracing::debug!(
                target: "registry",
                "restored {} user agents",
                tables.user_agents_by_key.len()
            );
        }
        Ok(registry)
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Key for `user_agent`, writing its record on first sight.
    ///
    /// The lookup, the record write and the table insert happen under one
    /// lock, so concurrent first sightings still produce a single record.
    pub fn intern(&self, index: &dyn IndexSink, user_agent: &UserAgent) -> IndexResult<String> {
        let mut tables = self.tables.lock();

        if let Some(key) = tables.keys_by_user_agent.get(user_agent) {
            return Ok(key.clone());
        }

        let key = tables.keys_by_user_agent.len().to_string();
        let record = UserAgentRecord {
            key: key.clone(),
            user_agent: user_agent.clone(),
        };
        index.add_entry(Category::UserAgent, &record.encode(), &self.location)?;

        tables
            .keys_by_user_agent
            .insert(user_agent.clone(), key.clone());
        tables
            .user_agents_by_key
            .insert(key.clone(), user_agent.clone());

        tracing::trace!(target: "registry", "new user agent {key}: {}", user_agent.description);
        Ok(key)
    }

    /// Keys for each descriptor in order. Repeated descriptors repeat keys.
    pub fn intern_all(
        &self,
        index: &dyn IndexSink,
        user_agents: &[UserAgent],
    ) -> IndexResult<Vec<String>> {
        user_agents
            .iter()
            .map(|user_agent| self.intern(index, user_agent))
            .collect()
    }

    pub fn lookup(&self, key: &str) -> Option<UserAgent> {
        self.tables.lock().user_agents_by_key.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.tables.lock().keys_by_user_agent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
