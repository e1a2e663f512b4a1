//! Configuration for the sync engine.
//!
//! # Example
//!
//! ```
//! use metasync::config::{CommitPolicy, EngineConfig};
//!
//! // Minimal config (uses defaults)
//! let config = EngineConfig::default();
//! assert_eq!(config.chunk_size, 500);
//!
//! // Full config
//! let config = EngineConfig {
//!     urls: vec!["http://localhost:8983".into()],
//!     collection: Some("documents".into()),
//!     commit_policy: CommitPolicy {
//!         enabled: true,
//!         commit_doc_count: 2000,
//!         commit_interval_ms: 30_000,
//!     },
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::codec::FieldMapping;

/// Configuration for the sync engine.
///
/// All fields have sensible defaults. At minimum, you should configure
/// `urls` and `collection` for production use.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Backend base URLs (first reachable one wins)
    #[serde(default)]
    pub urls: Vec<String>,

    /// Target collection/core name
    #[serde(default)]
    pub collection: Option<String>,

    /// Basic-auth credentials
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,

    /// Batch size for deletes, fetches and upserts
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Uploads since the last commit that force an immediate commit,
    /// independent of the commit policy
    #[serde(default = "default_forced_commit_threshold")]
    pub forced_commit_threshold: u64,

    /// Threshold/interval commit policy
    #[serde(default)]
    pub commit_policy: CommitPolicy,

    /// How commits are executed
    #[serde(default)]
    pub commit_options: CommitOptions,

    /// Static field-mapping overlays (suffix-coded doc field -> index field)
    #[serde(default)]
    pub field_mappings: Vec<FieldMapping>,
}

fn default_chunk_size() -> usize {
    500
}
fn default_forced_commit_threshold() -> u64 {
    100_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            collection: None,
            username: None,
            password: None,
            chunk_size: default_chunk_size(),
            forced_commit_threshold: default_forced_commit_threshold(),
            commit_policy: CommitPolicy::default(),
            commit_options: CommitOptions::default(),
            field_mappings: Vec::new(),
        }
    }
}

/// When the engine commits on its own.
///
/// A scheduled commit fires only when BOTH thresholds are exceeded: more
/// than `commit_doc_count` events accumulated AND more than
/// `commit_interval_ms` elapsed since the last commit. With both
/// thresholds at zero every scheduled check commits.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitPolicy {
    #[serde(default = "default_commit_enabled")]
    pub enabled: bool,

    #[serde(default = "default_commit_doc_count")]
    pub commit_doc_count: u64,

    #[serde(default = "default_commit_interval_ms")]
    pub commit_interval_ms: u64,
}

fn default_commit_enabled() -> bool {
    true
}
fn default_commit_doc_count() -> u64 {
    1000
}
fn default_commit_interval_ms() -> u64 {
    20_000
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            enabled: default_commit_enabled(),
            commit_doc_count: default_commit_doc_count(),
            commit_interval_ms: default_commit_interval_ms(),
        }
    }
}

/// How a commit call is executed by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitOptions {
    /// Soft commit: visibility without durability
    #[serde(default)]
    pub soft_commit: bool,

    /// Block until a new searcher is open
    #[serde(default = "default_true")]
    pub wait_for_searcher: bool,

    /// Block until index changes are flushed
    #[serde(default = "default_true")]
    pub wait_for_flush: bool,

    /// Let the backend schedule the commit itself within this many
    /// milliseconds (-1 = disabled)
    #[serde(default = "default_commit_within_ms")]
    pub commit_within_ms: i64,
}

fn default_true() -> bool {
    true
}
fn default_commit_within_ms() -> i64 {
    -1
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            soft_commit: false,
            wait_for_searcher: default_true(),
            wait_for_flush: default_true(),
            commit_within_ms: default_commit_within_ms(),
        }
    }
}
