// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Static field-mapping overlays.
//!
//! Most fields reach the index through the [`IndexCodec`], but some are
//! routed to fixed index fields instead: a copy-field target, a text
//! field with special analysis, or several index fields fed from one
//! document field. Mappings are declared in configuration with
//! suffix-coded document field names.

use dashmap::DashMap;
use serde::Deserialize;

use crate::codec::{FieldCodec, IndexCodec, SuffixCodec};
use crate::field::Field;

/// One configured route: a suffix-coded document field name and the
/// index field it lands in.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMapping {
    pub doc_field: String,
    pub index_field: String,
}

/// The resolved overlay plus fall-through to the index codec, with
/// concurrent caches on both directions.
#[derive(Debug, Default)]
pub struct FieldMappingSet {
    forward: DashMap<Field, Vec<String>>,
    reverse: DashMap<String, Vec<Field>>,
}

impl FieldMappingSet {
    pub fn new(mappings: &[FieldMapping]) -> Self {
        let suffix = SuffixCodec::default();
        let set = FieldMappingSet::default();
        for mapping in mappings {
            let field = suffix.decode(&mapping.doc_field);
            set.forward
                .entry(field.clone())
                .or_default()
                .push(mapping.index_field.clone());
            set.reverse
                .entry(mapping.index_field.clone())
                .or_default()
                .push(field);
        }
        set
    }

    /// Index field names a document field feeds. Unmapped fields encode
    /// through the codec; the result is cached.
    pub fn index_names(&self, field: &Field, codec: &IndexCodec) -> Vec<String> {
        if let Some(names) = self.forward.get(field) {
            return names.clone();
        }
        let names = vec![codec.encode(field)];
        self.forward.insert(field.clone(), names.clone());
        names
    }

    /// Document fields an index field maps back to.
    pub fn doc_fields(&self, name: &str, codec: &IndexCodec) -> Vec<Field> {
        if let Some(fields) = self.reverse.get(name) {
            return fields.clone();
        }
        let fields = vec![codec.decode(name)];
        self.reverse.insert(name.to_string(), fields.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::TypeKind;

    #[test]
    fn mapped_fields_use_the_overlay() {
        let set = FieldMappingSet::new(&[FieldMapping {
            doc_field: "content_s".into(),
            index_field: "content_tt".into(),
        }]);
        let codec = IndexCodec::new();
        let content = Field::string("content");

        assert_eq!(set.index_names(&content, &codec), vec!["content_tt"]);
        assert_eq!(set.doc_fields("content_tt", &codec), vec![content]);
    }

    #[test]
    fn one_document_field_can_feed_many_index_fields() {
        let set = FieldMappingSet::new(&[
            FieldMapping {
                doc_field: "title_s".into(),
                index_field: "title_txt".into(),
            },
            FieldMapping {
                doc_field: "title_s".into(),
                index_field: "title_sort_s".into(),
            },
        ]);
        let codec = IndexCodec::new();
        assert_eq!(
            set.index_names(&Field::string("title"), &codec),
            vec!["title_txt", "title_sort_s"]
        );
    }

    #[test]
    fn unmapped_fields_fall_through_to_the_codec() {
        let set = FieldMappingSet::default();
        let codec = IndexCodec::new();
        let field = Field::new("pages", TypeKind::Int);
        assert_eq!(set.index_names(&field, &codec), vec!["pages_i"]);
        assert_eq!(set.doc_fields("pages_i", &codec), vec![field]);
    }
}
