// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The search-backend client abstraction.
//!
//! The sync engine talks to the index exclusively through
//! [`BackendClient`]. Implementations own transport, authentication and
//! retry-free request execution; the engine never retries — a failed call
//! surfaces to the caller with the batch context attached.

mod memory;
mod wire;

pub use memory::InMemoryBackend;
pub use wire::{
    from_index_document, is_read_only, to_index_document, IndexDocument, INDEX_NULL_VALUE,
    READ_ONLY_FIELDS,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CommitOptions;
use crate::field::CoercionError;
use crate::schema::{SchemaError, SchemaSnapshot};

/// Errors surfaced by backend calls and wire translation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with a non-zero status. Fatal per call.
    #[error("backend returned status {status} during {operation}")]
    Status { operation: &'static str, status: i32 },

    /// Transport-level failure (connection, timeout, protocol).
    #[error("backend transport failure during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    /// A delete batch contained a blank document id. Checked before the
    /// network call; the whole batch is rejected.
    #[error("blank document id in delete batch of {} ids", .ids.len())]
    BlankDeleteId { ids: Vec<String> },

    /// A replace or merge event arrived without a document id.
    #[error("event carries no document id")]
    MissingId,

    /// A list value cannot land in a single-valued index field.
    #[error("cannot store {count} values in single-valued index field {name}")]
    MultiValueIntoSingle { name: String, count: usize },

    /// The engine was closed; in-flight and subsequent calls fail fast.
    #[error("sync engine is closed")]
    Closed,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Async client for a dynamic-schema search backend.
///
/// All batch operations are all-or-nothing from the engine's point of
/// view: implementations must not partially apply a batch and report
/// success.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Delete the given ids. Called with non-empty, non-blank batches.
    async fn delete_by_ids(&self, ids: &[String]) -> Result<(), BackendError>;

    /// Insert or fully replace the given documents.
    async fn upsert(&self, documents: &[IndexDocument]) -> Result<(), BackendError>;

    /// Fetch existing documents by id. Missing ids are simply absent
    /// from the result.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<IndexDocument>, BackendError>;

    /// Make pending changes durable/visible per the options.
    async fn commit(&self, options: &CommitOptions) -> Result<(), BackendError>;

    /// Discard uncommitted changes.
    async fn rollback(&self) -> Result<(), BackendError>;

    /// Report the current schema: exact fields and dynamic patterns.
    async fn introspect_schema(&self) -> Result<SchemaSnapshot, BackendError>;

    /// Cheap liveness probe.
    async fn ping(&self) -> Result<(), BackendError>;
}
