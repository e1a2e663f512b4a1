// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The synchronization engine.
//!
//! [`SyncEngine`] turns event batches into backend calls: it folds each
//! batch per document id, runs deletes first, resolves merges by fetching
//! the indexed state and layering the update over it, and sends upserts
//! in fixed-size chunks. Commits happen three ways:
//!
//! - forced: a push that uploads more than the configured threshold since
//!   the last commit triggers an immediate commit;
//! - post-push: after a push, if the commit policy's doc-count AND
//!   interval thresholds are both exceeded;
//! - scheduled: a background task checks the same policy at a fixed
//!   cadence, so a quiet engine still commits eventually.
//!
//! The engine never retries. Every backend error propagates to the
//! caller with its batch context; the caller decides whether to back off
//! and replay.

mod reduce;

pub use reduce::{reduce_events, Reduction};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{
    from_index_document, is_read_only, to_index_document, BackendClient, BackendError,
    IndexDocument,
};
use crate::codec::{FieldMappingSet, IndexCodec};
use crate::config::{CommitPolicy, CommitOptions, EngineConfig};
use crate::document::{Document, Event};
use crate::metrics;
use crate::schema::IndexSchema;
use crate::source::DocumentConsumer;

/// Floor for the scheduled commit check cadence.
const MIN_COMMIT_CHECK_MS: u64 = 2_000;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Commit bookkeeping shared between the push path and the scheduler.
struct CommitState {
    /// Events pushed since the last commit.
    uncommitted: AtomicU64,
    /// Epoch millis of the last commit (or engine start).
    last_commit_ms: AtomicI64,
    /// Documents uploaded since the last commit, for the forced commit.
    uploaded: AtomicU64,
}

impl CommitState {
    fn new() -> Self {
        CommitState {
            uncommitted: AtomicU64::new(0),
            last_commit_ms: AtomicI64::new(now_ms()),
            uploaded: AtomicU64::new(0),
        }
    }

    /// Policy check: both thresholds must be exceeded. A policy with
    /// both thresholds at zero commits on every check.
    fn time_to_commit(&self, policy: &CommitPolicy) -> bool {
        if !policy.enabled {
            return false;
        }
        if policy.commit_doc_count < 1 && policy.commit_interval_ms < 1 {
            return true;
        }
        let count = self.uncommitted.load(Ordering::Acquire);
        let elapsed = now_ms() - self.last_commit_ms.load(Ordering::Acquire);
        count > policy.commit_doc_count && elapsed > policy.commit_interval_ms as i64
    }

    fn mark_committed(&self) {
        self.uncommitted.store(0, Ordering::Release);
        self.uploaded.store(0, Ordering::Release);
        self.last_commit_ms.store(now_ms(), Ordering::Release);
    }
}

/// Schema-adaptive synchronization engine over a [`BackendClient`].
pub struct SyncEngine {
    backend: Arc<dyn BackendClient>,
    schema: Arc<IndexSchema>,
    codec: Arc<IndexCodec>,
    mapping: Arc<FieldMappingSet>,
    config: EngineConfig,
    /// Serializes the push path end to end.
    push_lock: tokio::sync::Mutex<()>,
    state: Arc<CommitState>,
    closed: Arc<AtomicBool>,
    committer: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl SyncEngine {
    pub fn new(backend: Arc<dyn BackendClient>, config: EngineConfig) -> Self {
        let mapping = FieldMappingSet::new(&config.field_mappings);
        SyncEngine {
            backend,
            schema: Arc::new(IndexSchema::empty()),
            codec: Arc::new(IndexCodec::new()),
            mapping: Arc::new(mapping),
            config,
            push_lock: tokio::sync::Mutex::new(()),
            state: Arc::new(CommitState::new()),
            closed: Arc::new(AtomicBool::new(false)),
            committer: parking_lot::Mutex::new(None),
        }
    }

    /// Initialize the schema cache (if still empty) and start the
    /// scheduled committer. Must be called once before `push`.
    pub async fn open(&self) -> Result<(), BackendError> {
        self.ensure_open()?;
        if !self.schema.is_initialized() {
            self.refresh_schema().await?;
        }
        if self.config.commit_policy.enabled {
            let mut slot = self.committer.lock();
            if slot.is_none() {
                *slot = Some(tokio::spawn(run_committer(
                    Arc::clone(&self.backend),
                    Arc::clone(&self.state),
                    self.config.commit_policy.clone(),
                    self.config.commit_options.clone(),
                    Arc::clone(&self.closed),
                )));
            }
        }
        info!(
            collection = self.config.collection.as_deref().unwrap_or("-"),
            chunk_size = self.config.chunk_size,
            "sync engine opened"
        );
        Ok(())
    }

    /// Re-introspect the backend schema and swap the cache.
    pub async fn refresh_schema(&self) -> Result<(), BackendError> {
        let snapshot = self.backend.introspect_schema().await?;
        self.schema.replace(snapshot)?;
        metrics::record_schema_refresh();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.is_closed() {
            return Err(BackendError::Closed);
        }
        Ok(())
    }

    /// Stop the engine. Subsequent and lock-waiting calls fail fast with
    /// [`BackendError::Closed`]; nothing is flushed implicitly.
    pub async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(handle) = self.committer.lock().take() {
            handle.abort();
        }
        info!("sync engine closed");
    }

    /// Apply an event batch: reduce per id, delete, resolve merges,
    /// upsert, then run the commit checks.
    pub async fn push(&self, events: &[Event]) -> Result<(), BackendError> {
        self.ensure_open()?;
        if events.is_empty() {
            return Ok(());
        }
        let started = Instant::now();
        let _guard = self.push_lock.lock().await;
        // close() may have landed while we waited on the lock.
        self.ensure_open()?;

        let reduction = reduce_events(events)?;
        debug!(
            events = events.len(),
            deletes = reduction.deletes.len(),
            replaces = reduction.replaces.len(),
            merges = reduction.merges.len(),
            "push batch reduced"
        );

        self.delete(&reduction.deletes).await?;

        let mut staged = Vec::with_capacity(reduction.replaces.len() + reduction.merges.len());
        for document in reduction.replaces.values() {
            staged.push(self.translate(document)?);
        }
        self.resolve_merges(&reduction, &mut staged).await?;
        self.upsert(&staged).await?;

        self.state
            .uncommitted
            .fetch_add(events.len() as u64, Ordering::AcqRel);
        metrics::record_push(events.len(), started.elapsed());
        metrics::set_uncommitted_events(self.state.uncommitted.load(Ordering::Acquire));

        if self.state.time_to_commit(&self.config.commit_policy) {
            self.backend.commit(&self.config.commit_options).await?;
            self.state.mark_committed();
            metrics::record_commit("policy");
            debug!("post-push policy commit");
        }
        Ok(())
    }

    /// Commit now (`force`) or only if the policy thresholds are met.
    pub async fn commit(&self, force: bool) -> Result<bool, BackendError> {
        self.ensure_open()?;
        if force || self.state.time_to_commit(&self.config.commit_policy) {
            self.backend.commit(&self.config.commit_options).await?;
            self.state.mark_committed();
            metrics::record_commit(if force { "forced" } else { "policy" });
            return Ok(true);
        }
        Ok(false)
    }

    /// Discard uncommitted backend changes.
    pub async fn rollback(&self) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.backend.rollback().await
    }

    fn translate(&self, document: &Document) -> Result<IndexDocument, BackendError> {
        to_index_document(document, &self.schema, &self.mapping, &self.codec)
    }

    /// Deletes run first, in chunks. A blank id anywhere in a chunk
    /// rejects the chunk before it reaches the network.
    async fn delete(&self, ids: &[String]) -> Result<(), BackendError> {
        for chunk in ids.chunks(self.config.chunk_size) {
            if chunk.iter().any(|id| id.trim().is_empty()) {
                return Err(BackendError::BlankDeleteId {
                    ids: chunk.to_vec(),
                });
            }
            self.backend.delete_by_ids(chunk).await?;
            metrics::record_deleted(chunk.len());
        }
        Ok(())
    }

    /// Fetch the indexed state for each merge id in chunks and layer the
    /// update over it: updated fields win, untouched existing fields
    /// survive, read-only fields never travel back.
    async fn resolve_merges(
        &self,
        reduction: &Reduction,
        staged: &mut Vec<IndexDocument>,
    ) -> Result<(), BackendError> {
        if reduction.merges.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = reduction.merges.keys().cloned().collect();
        for chunk in ids.chunks(self.config.chunk_size) {
            let started = Instant::now();
            let fetched = self.backend.fetch_by_ids(chunk).await?;
            let mut existing: HashMap<String, Document> = HashMap::with_capacity(fetched.len());
            for idoc in &fetched {
                if let Some(id) = idoc.id() {
                    existing.insert(id.to_string(), from_index_document(idoc, &self.codec)?);
                }
            }
            for id in chunk {
                let update = &reduction.merges[id];
                let merged = match existing.get(id) {
                    Some(current) => merge_over_existing(current, update),
                    None => update.clone(),
                };
                staged.push(self.translate(&merged)?);
            }
            metrics::record_fetch_merge(chunk.len(), started.elapsed());
        }
        Ok(())
    }

    async fn upsert(&self, staged: &[IndexDocument]) -> Result<(), BackendError> {
        for chunk in staged.chunks(self.config.chunk_size) {
            self.backend.upsert(chunk).await?;
            metrics::record_upserted(chunk.len());
            let uploaded =
                self.state.uploaded.fetch_add(chunk.len() as u64, Ordering::AcqRel)
                    + chunk.len() as u64;
            if uploaded > self.config.forced_commit_threshold {
                info!(uploaded, "upload threshold exceeded, committing");
                self.backend.commit(&self.config.commit_options).await?;
                self.state.mark_committed();
                metrics::record_commit("threshold");
            }
        }
        Ok(())
    }
}

/// Layer `update` over `current`: the update's fields win, remaining
/// existing fields are carried over, read-only index fields are dropped.
fn merge_over_existing(current: &Document, update: &Document) -> Document {
    let mut merged = update.clone();
    for (field, value) in current.iter() {
        if is_read_only(field.name()) {
            continue;
        }
        if !merged.contains_field(field) {
            merged.insert_typed(field.clone(), value.clone());
        }
    }
    merged
}

/// Background commit loop. Runs at a fixed cadence (never below
/// [`MIN_COMMIT_CHECK_MS`]) and commits when the policy says so. Errors
/// are logged and the loop keeps going; the next push will surface
/// persistent failures.
async fn run_committer(
    backend: Arc<dyn BackendClient>,
    state: Arc<CommitState>,
    policy: CommitPolicy,
    options: CommitOptions,
    closed: Arc<AtomicBool>,
) {
    let cadence = Duration::from_millis(policy.commit_interval_ms.max(MIN_COMMIT_CHECK_MS));
    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; skip it.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if closed.load(Ordering::Acquire) {
            break;
        }
        if state.time_to_commit(&policy) {
            match backend.commit(&options).await {
                Ok(()) => {
                    state.mark_committed();
                    metrics::record_commit("scheduled");
                    debug!("scheduled commit");
                }
                Err(error) => {
                    warn!(%error, "scheduled commit failed");
                }
            }
        }
    }
}

#[async_trait]
impl DocumentConsumer for SyncEngine {
    async fn push(&self, events: &[Event]) -> Result<(), BackendError> {
        SyncEngine::push(self, events).await
    }

    async fn commit(&self, force: bool) -> Result<(), BackendError> {
        SyncEngine::commit(self, force).await.map(|_| ())
    }
}
