// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory backend for tests and local development.
//!
//! Behaves like a tiny index: stores wire documents by id, stamps a
//! `_version_` on every upsert, and records every batch it receives so
//! tests can assert on chunking and call ordering.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::backend::{BackendClient, BackendError, IndexDocument};
use crate::config::CommitOptions;
use crate::schema::{default_snapshot, SchemaSnapshot};

pub struct InMemoryBackend {
    docs: DashMap<String, IndexDocument>,
    schema: SchemaSnapshot,
    delete_batches: Mutex<Vec<Vec<String>>>,
    upsert_batches: Mutex<Vec<Vec<IndexDocument>>>,
    commits: AtomicU64,
    rollbacks: AtomicU64,
    next_version: AtomicI64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_schema(default_snapshot())
    }

    pub fn with_schema(schema: SchemaSnapshot) -> Self {
        InMemoryBackend {
            docs: DashMap::new(),
            schema,
            delete_batches: Mutex::new(Vec::new()),
            upsert_batches: Mutex::new(Vec::new()),
            commits: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
            next_version: AtomicI64::new(1),
        }
    }

    pub fn get(&self, id: &str) -> Option<IndexDocument> {
        self.docs.get(id).map(|entry| entry.clone())
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> u64 {
        self.rollbacks.load(Ordering::SeqCst)
    }

    /// Delete batches in arrival order, for chunking assertions.
    pub fn delete_batches(&self) -> Vec<Vec<String>> {
        self.delete_batches.lock().clone()
    }

    /// Upsert batches in arrival order.
    pub fn upsert_batches(&self) -> Vec<Vec<IndexDocument>> {
        self.upsert_batches.lock().clone()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for InMemoryBackend {
    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), BackendError> {
        self.delete_batches.lock().push(ids.to_vec());
        for id in ids {
            self.docs.remove(id);
        }
        Ok(())
    }

    async fn upsert(&self, documents: &[IndexDocument]) -> Result<(), BackendError> {
        self.upsert_batches.lock().push(documents.to_vec());
        for doc in documents {
            let id = doc.id().ok_or(BackendError::MissingId)?.to_string();
            let mut stored = doc.clone();
            let version = self.next_version.fetch_add(1, Ordering::SeqCst);
            stored.set("_version_", serde_json::json!(version));
            self.docs.insert(id, stored);
        }
        Ok(())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<IndexDocument>, BackendError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.docs.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn commit(&self, _options: &CommitOptions) -> Result<(), BackendError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), BackendError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn introspect_schema(&self) -> Result<SchemaSnapshot, BackendError> {
        Ok(self.schema.clone())
    }

    async fn ping(&self) -> Result<(), BackendError> {
        Ok(())
    }
}
