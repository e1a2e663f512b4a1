// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The wire form of a document and the translation in both directions.
//!
//! On the wire a document is an ordered map of codec-encoded field names
//! to JSON-native values: datetimes as ISO-8601 offset strings, bytes as
//! Base64, child documents nested under `_childDocuments_`. Translation
//! into wire form consults the schema cache for every target field and
//! fails fast when a field resolves to the not-existing sentinel.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::backend::BackendError;
use crate::codec::{FieldCodec, FieldMappingSet, IndexCodec};
use crate::document::Document;
use crate::field::{known, CoercionError, FieldValue, TypeKind};
use crate::schema::{IndexFieldType, IndexSchema, IndexType, SchemaError};

/// Sentinel encoding a null string value on the wire.
pub const INDEX_NULL_VALUE: &str = "\u{0}";

/// Index-managed fields that must never be written by the engine.
pub const READ_ONLY_FIELDS: &[&str] = &["_version_", "_root_"];

const CHILD_DOCUMENTS_KEY: &str = "_childDocuments_";

pub fn is_read_only(name: &str) -> bool {
    READ_ONLY_FIELDS.contains(&name)
}

/// A document in wire form: ordered encoded fields plus nested children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexDocument {
    fields: IndexMap<String, Value>,
    children: Vec<IndexDocument>,
}

impl IndexDocument {
    pub fn new() -> Self {
        IndexDocument::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn add_child(&mut self, child: IndexDocument) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[IndexDocument] {
        &self.children
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for IndexDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.children.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        if !self.children.is_empty() {
            map.serialize_entry(CHILD_DOCUMENTS_KEY, &self.children)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndexDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = serde_json::Map::<String, Value>::deserialize(deserializer)?;
        let children = match raw.remove(CHILD_DOCUMENTS_KEY) {
            Some(value) => {
                serde_json::from_value(value).map_err(D::Error::custom)?
            }
            None => Vec::new(),
        };
        Ok(IndexDocument {
            fields: raw.into_iter().collect(),
            children,
        })
    }
}

/// Translate a typed document into wire form.
///
/// Every field is routed through the mapping overlay and the codec, then
/// checked against the schema. Read-only targets are silently skipped;
/// an unresolvable target is a hard error.
pub fn to_index_document(
    doc: &Document,
    schema: &IndexSchema,
    mapping: &FieldMappingSet,
    codec: &IndexCodec,
) -> Result<IndexDocument, BackendError> {
    let mut out = IndexDocument::new();
    for (field, value) in doc.iter() {
        // Children travel as nested documents, not as a field.
        if field == &*known::CHILDREN {
            continue;
        }
        for name in mapping.index_names(field, codec) {
            if is_read_only(&name) {
                continue;
            }
            let ft = schema.field_type(&name);
            if ft.is_not_existing() {
                return Err(SchemaError::UnknownIndexField { name }.into());
            }
            if let Some(wire) = to_index_value(&name, &ft, value)? {
                out.set(name, wire);
            }
        }
    }
    for child in doc.children() {
        out.add_child(to_index_document(child, schema, mapping, codec)?);
    }
    Ok(out)
}

/// Convert one field value for one resolved index field.
///
/// Lists land in multivalued fields as arrays; into single-valued fields
/// only when they hold at most one element (empty lists are dropped).
fn to_index_value(
    name: &str,
    ft: &IndexFieldType,
    value: &FieldValue,
) -> Result<Option<Value>, BackendError> {
    let Some(scalar_kind) = wire_kind(ft.kind) else {
        return Ok(Some(value.to_json()));
    };

    if value.kind().is_list() {
        let list_kind = scalar_kind
            .list_kind()
            .unwrap_or(TypeKind::StringList);
        let coerced = list_kind.coerce(value.clone())?;
        let Value::Array(items) = coerced.to_json() else {
            return Ok(Some(coerced.to_json()));
        };
        if ft.multivalued {
            return Ok(Some(Value::Array(items)));
        }
        let mut items = items;
        match items.len() {
            0 => Ok(None),
            1 => Ok(Some(items.remove(0))),
            count => Err(BackendError::MultiValueIntoSingle {
                name: name.to_string(),
                count,
            }),
        }
    } else {
        let coerced = scalar_kind.coerce(value.clone())?;
        Ok(Some(coerced.to_json()))
    }
}

/// The typed kind whose JSON encoding matches an index value type.
fn wire_kind(kind: IndexType) -> Option<TypeKind> {
    match kind {
        IndexType::String | IndexType::Text => Some(TypeKind::String),
        IndexType::Boolean => Some(TypeKind::Boolean),
        IndexType::Int => Some(TypeKind::Int),
        IndexType::Long => Some(TypeKind::Long),
        IndexType::Float => Some(TypeKind::Float),
        IndexType::Double => Some(TypeKind::Double),
        IndexType::Datetime => Some(TypeKind::Datetime),
        IndexType::Binary => Some(TypeKind::Bytes),
        IndexType::Unknown => None,
    }
}

/// Rebuild a typed document from its wire form. Field kinds are
/// re-inferred from the encoded names; null-string sentinels are
/// dropped.
pub fn from_index_document(
    idoc: &IndexDocument,
    codec: &IndexCodec,
) -> Result<Document, CoercionError> {
    let mut doc = Document::new();
    for (name, value) in idoc.fields() {
        if value.as_str() == Some(INDEX_NULL_VALUE) {
            continue;
        }
        let field = codec.decode(name);
        doc.insert(&field, value.clone())?;
    }
    for child in idoc.children() {
        doc.add_child(from_index_document(child, codec)?);
    }
    Ok(doc)
}
