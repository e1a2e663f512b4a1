// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Identity codec with kind memory.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::codec::FieldCodec;
use crate::field::{detect_kind, Field, TypeKind};

/// Bidirectional name/field map. Both directions stay consistent because
/// all inserts go through [`BiMap::insert`].
#[derive(Debug, Default)]
struct BiMap {
    by_name: HashMap<String, Field>,
    by_field: HashMap<Field, String>,
}

impl BiMap {
    fn insert(&mut self, name: String, field: Field) {
        self.by_field.insert(field.clone(), name.clone());
        self.by_name.insert(name, field);
    }
}

/// Codec whose external names are the field names themselves.
///
/// Kinds do not travel in the name, so the codec keeps a bidirectional
/// cache. Decoding an unknown name yields a string field unless a sample
/// value is supplied, in which case the kind is inferred once and cached
/// under a write lock (double-checked, so concurrent decoders agree).
#[derive(Debug, Default)]
pub struct PlainCodec {
    cache: RwLock<BiMap>,
}

impl PlainCodec {
    pub fn new() -> Self {
        PlainCodec::default()
    }

    /// Pre-seed the cache with a known field set.
    pub fn with_fields<I: IntoIterator<Item = Field>>(fields: I) -> Self {
        let codec = PlainCodec::new();
        {
            let mut cache = codec.cache.write();
            for field in fields {
                cache.insert(field.name().to_string(), field);
            }
        }
        codec
    }
}

impl FieldCodec for PlainCodec {
    fn encode(&self, field: &Field) -> String {
        let cache = self.cache.read();
        cache
            .by_field
            .get(field)
            .cloned()
            .unwrap_or_else(|| field.name().to_string())
    }

    fn decode(&self, name: &str) -> Field {
        let cache = self.cache.read();
        cache
            .by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| Field::new(name, TypeKind::String))
    }

    fn decode_with_value(&self, name: &str, sample: &Value) -> Field {
        {
            let cache = self.cache.read();
            if let Some(field) = cache.by_name.get(name) {
                return field.clone();
            }
        }
        let mut cache = self.cache.write();
        // Double-check: another thread may have inferred it between locks.
        if let Some(field) = cache.by_name.get(name) {
            return field.clone();
        }
        let field = Field::new(name, detect_kind(sample));
        cache.insert(name.to_string(), field.clone());
        field
    }
}
