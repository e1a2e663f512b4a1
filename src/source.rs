// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Collaborator contracts around the engine.
//!
//! Sources produce pages of events, consumers apply them, and cursor
//! stores persist resume positions. The engine implements
//! [`DocumentConsumer`]; everything else lives outside this crate and
//! plugs in through these traits.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::backend::BackendError;
use crate::document::{Cursor, DocumentPage, Event};

/// Cursor store failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cursor store failure during {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("cursor {id} is malformed: {reason}")]
    Malformed { id: String, reason: String },
}

/// Source-side failures: its own persistence or the backend it reads.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("source failure: {0}")]
    Other(String),
}

/// A pull-based event producer with a resumable position.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Stable identity of this source, used as the cursor id.
    fn id(&self) -> &str;

    /// Pull the next page. An empty page with `has_next == false` means
    /// the source is drained for now.
    async fn next_page(&mut self) -> Result<DocumentPage, SourceError>;

    /// Persist the current position, called after the page's events have
    /// been consumed successfully.
    async fn save(&mut self) -> Result<(), SourceError>;
}

/// Something that applies event batches, usually the sync engine.
#[async_trait]
pub trait DocumentConsumer: Send + Sync {
    async fn push(&self, events: &[Event]) -> Result<(), BackendError>;

    /// Commit now (`force`) or per the consumer's own policy.
    async fn commit(&self, force: bool) -> Result<(), BackendError>;
}

/// Durable cursor storage keyed by cursor id.
///
/// Implementations must allow at most one in-flight write per id;
/// concurrent saves of different ids may proceed in parallel.
#[async_trait]
pub trait CursorPersistence: Send + Sync {
    async fn save(&self, cursor: &Cursor) -> Result<(), PersistenceError>;

    async fn load(&self, id: &str) -> Result<Option<Cursor>, PersistenceError>;

    /// Returns whether a cursor existed.
    async fn delete(&self, id: &str) -> Result<bool, PersistenceError>;
}

const CURSOR_SHARDS: usize = 16;

/// In-memory cursor store with a fixed sharded lock table.
///
/// Each id hashes to one of [`CURSOR_SHARDS`] locks, which serializes
/// writes per id without a per-id lock map that would need pruning.
/// Cursors are stored in their JSON interchange form, the same bytes a
/// file- or database-backed store would hold.
pub struct MemoryCursorStore {
    shards: Vec<Mutex<HashMap<String, String>>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        MemoryCursorStore {
            shards: (0..CURSOR_SHARDS)
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
        }
    }

    fn shard(&self, id: &str) -> &Mutex<HashMap<String, String>> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        &self.shards[hasher.finish() as usize % CURSOR_SHARDS]
    }
}

impl Default for MemoryCursorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CursorPersistence for MemoryCursorStore {
    async fn save(&self, cursor: &Cursor) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(cursor).map_err(|e| PersistenceError::Store {
            operation: "save",
            message: e.to_string(),
        })?;
        let mut shard = self.shard(&cursor.id).lock().await;
        shard.insert(cursor.id.clone(), json);
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Cursor>, PersistenceError> {
        let shard = self.shard(id).lock().await;
        match shard.get(id) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| PersistenceError::Malformed {
                    id: id.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, PersistenceError> {
        let mut shard = self.shard(id).lock().await;
        Ok(shard.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::field::{Field, TypeKind};

    #[tokio::test]
    async fn save_load_delete_round_trip() {
        let store = MemoryCursorStore::new();
        let fields = Document::builder()
            .field(&Field::new("offset", TypeKind::Long), 42i64)
            .unwrap()
            .build();
        let cursor = Cursor::with_fields("src-1", fields);

        store.save(&cursor).await.unwrap();
        let loaded = store.load("src-1").await.unwrap().unwrap();
        assert_eq!(loaded, cursor);

        assert!(store.delete("src-1").await.unwrap());
        assert!(!store.delete("src-1").await.unwrap());
        assert!(store.load("src-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn kinds_survive_the_interchange_form() {
        let store = MemoryCursorStore::new();
        let fields = Document::builder()
            .field(&Field::new("watermark", TypeKind::Datetime), "2026-05-01T00:00:00Z")
            .unwrap()
            .build();
        store
            .save(&Cursor::with_fields("src-2", fields))
            .await
            .unwrap();

        let loaded = store.load("src-2").await.unwrap().unwrap();
        let value = loaded
            .fields
            .get(&Field::new("watermark", TypeKind::Datetime))
            .unwrap();
        assert_eq!(value.kind(), TypeKind::Datetime);
    }

    #[tokio::test]
    async fn parallel_saves_of_distinct_ids() {
        let store = std::sync::Arc::new(MemoryCursorStore::new());
        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(&Cursor::new(format!("src-{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        for i in 0..64 {
            assert!(store.load(&format!("src-{i}")).await.unwrap().is_some());
        }
    }
}
