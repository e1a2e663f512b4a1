// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The backend schema cache.
//!
//! Translating a document into its wire form needs the backend's view of
//! every target field: its value type and whether it is multivalued. The
//! cache holds the exact field table plus the dynamic-field patterns,
//! resolved most-specific-first. Lookups are read-mostly behind a
//! `parking_lot::RwLock`; `refresh` swaps the whole table under the
//! write lock.
//!
//! A miss resolves to the not-existing sentinel. Callers must treat the
//! sentinel as a hard error: writing a field the backend has no type for
//! would silently corrupt the index mapping.

mod pattern;

pub use pattern::SchemaPattern;

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Schema resolution errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The schema cache resolved a field to the not-existing sentinel.
    #[error("unknown index field: {name}")]
    UnknownIndexField { name: String },

    /// A dynamic-field pattern from the backend did not parse.
    #[error("invalid dynamic field pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Value types a backend field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    String,
    Text,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Datetime,
    Binary,
    Unknown,
}

/// A backend field's resolved type information.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexFieldType {
    pub name: String,
    pub kind: IndexType,
    #[serde(default)]
    pub type_class: Option<String>,
    #[serde(default)]
    pub multivalued: bool,
    #[serde(default)]
    pub missing_first: bool,
    #[serde(default)]
    pub missing_last: bool,
}

impl IndexFieldType {
    const NOT_EXISTING_NAME: &'static str = "__not_existing__";

    pub fn new(name: impl Into<String>, kind: IndexType, multivalued: bool) -> Self {
        IndexFieldType {
            name: name.into(),
            kind,
            type_class: None,
            multivalued,
            missing_first: false,
            missing_last: false,
        }
    }

    /// The sentinel returned for unresolvable names.
    pub fn not_existing() -> Self {
        IndexFieldType::new(Self::NOT_EXISTING_NAME, IndexType::Unknown, false)
    }

    pub fn is_not_existing(&self) -> bool {
        self.name == Self::NOT_EXISTING_NAME
    }
}

/// A full schema as reported by the backend: exact fields plus dynamic
/// field patterns with their types.
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    pub fields: Vec<(String, IndexFieldType)>,
    pub dynamic_fields: Vec<(String, IndexFieldType)>,
}

struct Inner {
    exact: HashMap<String, IndexFieldType>,
    dynamic: Vec<(SchemaPattern, IndexFieldType)>,
    initialized: bool,
}

/// Read-mostly cache of the backend schema.
pub struct IndexSchema {
    inner: RwLock<Inner>,
}

impl IndexSchema {
    /// An uninitialized cache; the engine refreshes it on open.
    pub fn empty() -> Self {
        IndexSchema {
            inner: RwLock::new(Inner {
                exact: HashMap::new(),
                dynamic: Vec::new(),
                initialized: false,
            }),
        }
    }

    /// A cache pre-loaded with the conventional dynamic-field table, for
    /// backends provisioned with the stock configuration.
    pub fn with_defaults() -> Self {
        let schema = IndexSchema::empty();
        schema
            .replace(default_snapshot())
            .unwrap_or_else(|e| unreachable!("default schema patterns are valid: {e}"));
        schema
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.read().initialized
    }

    /// Resolve a field name: exact table first, then the dynamic
    /// patterns most-specific-first, else the sentinel.
    pub fn field_type(&self, name: &str) -> IndexFieldType {
        let inner = self.inner.read();
        if let Some(ft) = inner.exact.get(name) {
            return ft.clone();
        }
        for (pattern, ft) in &inner.dynamic {
            if pattern.matches(name) {
                return ft.clone();
            }
        }
        IndexFieldType::not_existing()
    }

    /// Swap in a new schema under the write lock. Dynamic patterns are
    /// ordered exact-first, then by descending literal length.
    pub fn replace(&self, snapshot: SchemaSnapshot) -> Result<(), SchemaError> {
        let exact: HashMap<String, IndexFieldType> = snapshot.fields.into_iter().collect();
        let mut dynamic = snapshot
            .dynamic_fields
            .into_iter()
            .map(|(spec, ft)| {
                SchemaPattern::parse(&spec)
                    .map(|pattern| (pattern, ft))
                    .map_err(|reason| SchemaError::InvalidPattern {
                        pattern: spec.clone(),
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        dynamic.sort_by(|(a, _), (b, _)| {
            b.is_exact()
                .cmp(&a.is_exact())
                .then(b.literal_len().cmp(&a.literal_len()))
        });

        debug!(
            exact = exact.len(),
            dynamic = dynamic.len(),
            "index schema replaced"
        );
        let mut inner = self.inner.write();
        inner.exact = exact;
        inner.dynamic = dynamic;
        inner.initialized = true;
        Ok(())
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        IndexSchema::with_defaults()
    }
}

/// The stock schema: system fields plus the conventional dynamic-field
/// suffix table.
pub fn default_snapshot() -> SchemaSnapshot {
    let field = |name: &str, kind, mv| (name.to_string(), IndexFieldType::new(name, kind, mv));
    SchemaSnapshot {
        fields: vec![
            field("id", IndexType::String, false),
            field("_version_", IndexType::Long, false),
            field("_root_", IndexType::String, false),
            field("_text_", IndexType::Text, true),
        ],
        dynamic_fields: vec![
            field("*_s", IndexType::String, false),
            field("*_ss", IndexType::String, true),
            field("*_b", IndexType::Boolean, false),
            field("*_bs", IndexType::Boolean, true),
            field("*_i", IndexType::Int, false),
            field("*_is", IndexType::Int, true),
            field("*_l", IndexType::Long, false),
            field("*_ls", IndexType::Long, true),
            field("*_f", IndexType::Float, false),
            field("*_fs", IndexType::Float, true),
            field("*_d", IndexType::Double, false),
            field("*_ds", IndexType::Double, true),
            field("*_dt", IndexType::Datetime, false),
            field("*_dts", IndexType::Datetime, true),
            field("*_time", IndexType::Datetime, false),
            field("*_bin", IndexType::Binary, false),
            field("*_tt", IndexType::Text, false),
            field("*_txt", IndexType::Text, true),
            field("*_text", IndexType::Text, true),
        ],
    }
}
