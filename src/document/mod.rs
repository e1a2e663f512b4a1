// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The ordered, type-checked document container.
//!
//! A [`Document`] maps [`Field`]s to [`FieldValue`]s in insertion order.
//! Every write passes through the field kind's coercion, so a stored value
//! always matches its field's declared kind. Lookups never cross kinds:
//! asking for `count:string` will not see a value stored under
//! `count:int`.
//!
//! # Example
//!
//! ```
//! use metasync::document::Document;
//! use metasync::field::known;
//!
//! let doc = Document::builder()
//!     .field(&known::ID, "doc-1")?
//!     .field(&known::TITLE, "Quarterly report")?
//!     .field(&known::IS_FOLDER, false)?
//!     .build();
//! assert_eq!(doc.id(), Some("doc-1"));
//! # Ok::<(), metasync::field::CoercionError>(())
//! ```

mod event;

pub use event::{Action, Cursor, DocumentPage, Event};

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::codec::{FieldCodec, SuffixCodec};
use crate::field::{known, detect_kind, CoercionError, Field, FieldValue, RawValue, TypeKind};

/// An insertion-ordered collection of typed fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: IndexMap<Field, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Coerce and store a value. Overwriting an existing field keeps its
    /// original position; a new field appends.
    pub fn insert(
        &mut self,
        field: &Field,
        value: impl Into<RawValue>,
    ) -> Result<Option<FieldValue>, CoercionError> {
        let coerced = field.kind().coerce(value)?;
        Ok(self.fields.insert(field.clone(), coerced))
    }

    /// Store an already-typed value without recoercion. The value's kind
    /// must match the field's kind.
    pub(crate) fn insert_typed(&mut self, field: Field, value: FieldValue) {
        debug_assert_eq!(field.kind(), value.kind());
        self.fields.insert(field, value);
    }

    pub fn get(&self, field: &Field) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_or<'a>(&'a self, field: &Field, default: &'a FieldValue) -> &'a FieldValue {
        self.fields.get(field).unwrap_or(default)
    }

    pub fn contains_field(&self, field: &Field) -> bool {
        self.fields.contains_key(field)
    }

    /// Remove a field, preserving the order of the remaining entries.
    pub fn remove(&mut self, field: &Field) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    /// Keep-list retention: drop every field NOT in `keep`.
    pub fn retain_fields(&mut self, keep: &[Field]) {
        self.fields.retain(|field, _| keep.contains(field));
    }

    /// Append a child document to the `children` field, creating it on
    /// first use.
    pub fn add_child(&mut self, child: Document) {
        let children = known::CHILDREN.clone();
        match self.fields.get_mut(&children) {
            Some(FieldValue::DocList(docs)) => docs.push(child),
            _ => {
                self.fields.insert(children, FieldValue::DocList(vec![child]));
            }
        }
    }

    pub fn children(&self) -> &[Document] {
        self.fields
            .get(&*known::CHILDREN)
            .and_then(FieldValue::as_documents)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &FieldValue)> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(Field::name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn id(&self) -> Option<&str> {
        self.get(&known::ID).and_then(FieldValue::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get(&known::TITLE).and_then(FieldValue::as_str)
    }

    pub fn class_name(&self) -> Option<&str> {
        self.get(&known::CLASS_NAME).and_then(FieldValue::as_str)
    }

    pub fn is_folder(&self) -> bool {
        self.get(&known::IS_FOLDER)
            .and_then(FieldValue::as_bool)
            .unwrap_or(false)
    }

    pub fn modified_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.get(&known::MODIFY_DATETIME)
            .and_then(FieldValue::as_datetime)
    }

    /// Copy this document into a builder for override-style edits.
    pub fn to_builder(&self) -> DocumentBuilder {
        DocumentBuilder {
            fields: self.fields.clone(),
        }
    }

    /// Suffix-coded JSON form: field names carry their kind as a
    /// `_suffix` token so the kinds survive a round trip through any
    /// plain JSON store.
    pub fn to_suffix_map(&self) -> serde_json::Map<String, Value> {
        let codec = SuffixCodec::default();
        self.fields
            .iter()
            .map(|(field, value)| (codec.encode(field), value.to_json()))
            .collect()
    }

    /// Rebuild a document from its suffix-coded JSON form, re-inferring
    /// each field's kind from the name suffix.
    pub fn from_suffix_map(
        map: &serde_json::Map<String, Value>,
    ) -> Result<Document, CoercionError> {
        let codec = SuffixCodec::default();
        let mut doc = Document::new();
        for (name, value) in map {
            let field = codec.decode(name);
            let typed = decode_suffix_value(field.kind(), value)?;
            doc.insert_typed(field, typed);
        }
        Ok(doc)
    }
}

/// JSON decoding with composite-kind recursion: nested documents are
/// themselves suffix-coded maps, value maps re-infer per-entry kinds.
fn decode_suffix_value(kind: TypeKind, value: &Value) -> Result<FieldValue, CoercionError> {
    match kind {
        TypeKind::Document => match value {
            Value::Object(map) => Ok(FieldValue::Doc(Document::from_suffix_map(map)?)),
            other => kind.coerce(other.clone()),
        },
        TypeKind::DocumentList => match value {
            Value::Array(items) => {
                let docs = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Document::from_suffix_map(map),
                        other => match kind.coerce(other.clone())? {
                            FieldValue::DocList(mut docs) if docs.len() == 1 => {
                                Ok(docs.remove(0))
                            }
                            _ => Err(CoercionError::Incompatible {
                                kind,
                                value: other.to_string(),
                            }),
                        },
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldValue::DocList(docs))
            }
            other => kind.coerce(other.clone()),
        },
        TypeKind::ValueMap => match value {
            Value::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), detect_kind(v).coerce(v.clone())?)))
                    .collect::<Result<_, CoercionError>>()?;
                Ok(FieldValue::ValueMap(entries))
            }
            other => kind.coerce(other.clone()),
        },
        TypeKind::ValueMapList => match value {
            Value::Array(items) => {
                let maps = items
                    .iter()
                    .map(|item| match decode_suffix_value(TypeKind::ValueMap, item)? {
                        FieldValue::ValueMap(m) => Ok(m),
                        _ => Err(CoercionError::Incompatible {
                            kind,
                            value: item.to_string(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldValue::ValueMapList(maps))
            }
            other => kind.coerce(other.clone()),
        },
        _ => kind.coerce(value.clone()),
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self.to_suffix_map();
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (name, value) in &map {
            out.serialize_entry(name, value)?;
        }
        out.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        Document::from_suffix_map(&map).map_err(D::Error::custom)
    }
}

/// Incremental document construction. Each `field` call coerces, so the
/// builder can be threaded with `?`.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    fields: IndexMap<Field, FieldValue>,
}

impl DocumentBuilder {
    pub fn field(
        mut self,
        field: &Field,
        value: impl Into<RawValue>,
    ) -> Result<Self, CoercionError> {
        let coerced = field.kind().coerce(value)?;
        self.fields.insert(field.clone(), coerced);
        Ok(self)
    }

    /// Bulk-merge another document's fields; on key collision the merged
    /// document's value wins.
    pub fn fields(mut self, other: &Document) -> Self {
        for (field, value) in other.iter() {
            self.fields.insert(field.clone(), value.clone());
        }
        self
    }

    pub fn remove(mut self, field: &Field) -> Self {
        self.fields.shift_remove(field);
        self
    }

    pub fn id(self, id: impl Into<String>) -> Result<Self, CoercionError> {
        self.field(&known::ID, id.into())
    }

    pub fn title(self, title: impl Into<String>) -> Result<Self, CoercionError> {
        self.field(&known::TITLE, title.into())
    }

    pub fn content(self, content: impl Into<String>) -> Result<Self, CoercionError> {
        self.field(&known::CONTENT, content.into())
    }

    pub fn build(self) -> Document {
        Document {
            fields: self.fields,
        }
    }
}
