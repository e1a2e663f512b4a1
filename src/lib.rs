//! # metasync
//!
//! A typed-document synchronization engine for dynamic-schema search
//! backends.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Document Sources                        │
//! │  • Produce pages of replace/merge/delete events             │
//! │  • Resume from suffix-coded cursors                         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Typed Document Model                     │
//! │  • Closed 24-kind type registry                             │
//! │  • Fields keyed by (name, kind); every write coerces        │
//! │  • Insertion-ordered containers                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                   (codecs + schema cache)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Sync Engine                            │
//! │  • Per-id event reduction                                   │
//! │  • Deletes first, fetch-then-merge, chunked upserts         │
//! │  • Threshold/interval commit policy + forced commits        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Backend Client                           │
//! │  • Dynamic-schema search index behind an async trait        │
//! │  • Wire documents with codec-encoded field names            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use metasync::{Document, EngineConfig, Event, InMemoryBackend, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), metasync::BackendError> {
//!     let backend = Arc::new(InMemoryBackend::new());
//!     let engine = SyncEngine::new(backend, EngineConfig::default());
//!     engine.open().await?;
//!
//!     let doc = Document::builder()
//!         .id("report-1")?
//!         .title("Quarterly report")?
//!         .content("…")?
//!         .build();
//!     engine.push(&[Event::replace(doc)]).await?;
//!
//!     engine.commit(true).await?;
//!     engine.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`field`]: the closed type registry, typed values and coercion
//! - [`document`]: ordered documents, events, pages and cursors
//! - [`codec`]: plain/suffix/index field-name codecs and mapping overlays
//! - [`schema`]: the backend schema cache with wildcard patterns
//! - [`backend`]: the async backend client trait and wire translation
//! - [`engine`]: event reduction and the [`SyncEngine`]
//! - [`source`]: source/consumer/cursor-persistence contracts

pub mod backend;
pub mod codec;
pub mod config;
pub mod document;
pub mod engine;
pub mod field;
pub mod metrics;
pub mod schema;
pub mod source;

pub use backend::{BackendClient, BackendError, InMemoryBackend, IndexDocument};
pub use codec::{FieldCodec, IndexCodec, PlainCodec, SuffixCodec};
pub use config::{CommitOptions, CommitPolicy, EngineConfig};
pub use document::{Action, Cursor, Document, DocumentPage, Event};
pub use engine::SyncEngine;
pub use field::{CoercionError, Field, FieldValue, TypeKind};
pub use schema::{IndexFieldType, IndexSchema, IndexType, SchemaError};
pub use source::{CursorPersistence, DocumentConsumer, DocumentSource, MemoryCursorStore};
