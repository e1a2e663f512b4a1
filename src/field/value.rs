// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Typed field values and the coercion rules that admit loose input.
//!
//! Every value stored in a [`Document`](crate::document::Document) is a
//! [`FieldValue`] variant matching its field's [`TypeKind`]. Input arrives
//! either already typed or as loose JSON; [`TypeKind::coerce`] is the single
//! gate through which all of it passes. Coercion is total per kind: it
//! either produces the declared variant or fails with [`CoercionError`] —
//! there is no best-effort storage of mistyped values.

use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::document::Document;
use crate::field::TypeKind;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Error raised when a value cannot become the declared kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    /// The value's shape or content does not parse into the kind.
    #[error("cannot coerce {value} into {kind}")]
    Value { kind: TypeKind, value: String },

    /// Composite kinds accept only an already-typed instance (or a
    /// correctly-keyed mapping). Anything else is fatal.
    #[error("incompatible value for composite kind {kind}: {value}")]
    Incompatible { kind: TypeKind, value: String },
}

impl CoercionError {
    fn value(kind: TypeKind, raw: &RawValue) -> Self {
        CoercionError::Value {
            kind,
            value: raw.describe(),
        }
    }

    fn incompatible(kind: TypeKind, raw: &RawValue) -> Self {
        CoercionError::Incompatible {
            kind,
            value: raw.describe(),
        }
    }
}

/// A value held by a document field. One variant per [`TypeKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i32),
    Double(f64),
    Float(f32),
    Long(i64),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Datetime(DateTime<Utc>),
    StrList(Vec<String>),
    BoolList(Vec<bool>),
    IntList(Vec<i32>),
    DoubleList(Vec<f64>),
    FloatList(Vec<f32>),
    LongList(Vec<i64>),
    UuidList(Vec<Uuid>),
    BytesList(Vec<Vec<u8>>),
    DatetimeList(Vec<DateTime<Utc>>),
    Doc(Document),
    UntypedMap(IndexMap<String, Value>),
    ValueMap(IndexMap<String, FieldValue>),
    DocList(Vec<Document>),
    UntypedMapList(Vec<IndexMap<String, Value>>),
    ValueMapList(Vec<IndexMap<String, FieldValue>>),
}

impl FieldValue {
    /// The kind this variant belongs to.
    pub fn kind(&self) -> TypeKind {
        match self {
            FieldValue::Str(_) => TypeKind::String,
            FieldValue::Bool(_) => TypeKind::Boolean,
            FieldValue::Int(_) => TypeKind::Int,
            FieldValue::Double(_) => TypeKind::Double,
            FieldValue::Float(_) => TypeKind::Float,
            FieldValue::Long(_) => TypeKind::Long,
            FieldValue::Uuid(_) => TypeKind::Uuid,
            FieldValue::Bytes(_) => TypeKind::Bytes,
            FieldValue::Datetime(_) => TypeKind::Datetime,
            FieldValue::StrList(_) => TypeKind::StringList,
            FieldValue::BoolList(_) => TypeKind::BooleanList,
            FieldValue::IntList(_) => TypeKind::IntList,
            FieldValue::DoubleList(_) => TypeKind::DoubleList,
            FieldValue::FloatList(_) => TypeKind::FloatList,
            FieldValue::LongList(_) => TypeKind::LongList,
            FieldValue::UuidList(_) => TypeKind::UuidList,
            FieldValue::BytesList(_) => TypeKind::BytesList,
            FieldValue::DatetimeList(_) => TypeKind::DatetimeList,
            FieldValue::Doc(_) => TypeKind::Document,
            FieldValue::UntypedMap(_) => TypeKind::UntypedMap,
            FieldValue::ValueMap(_) => TypeKind::ValueMap,
            FieldValue::DocList(_) => TypeKind::DocumentList,
            FieldValue::UntypedMapList(_) => TypeKind::UntypedMapList,
            FieldValue::ValueMapList(_) => TypeKind::ValueMapList,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Datetime(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_documents(&self) -> Option<&[Document]> {
        match self {
            FieldValue::DocList(docs) => Some(docs),
            _ => None,
        }
    }

    /// Kind-specific JSON encoding: datetimes become ISO-8601 offset
    /// strings, bytes become Base64, documents become suffix-coded maps
    /// (see [`Document::to_suffix_map`](crate::document::Document)).
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(v) => Value::from(*v),
            FieldValue::Double(v) => Value::from(*v),
            FieldValue::Float(v) => Value::from(*v as f64),
            FieldValue::Long(v) => Value::from(*v),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::Bytes(b) => Value::String(BASE64.encode(b)),
            FieldValue::Datetime(t) => Value::String(datetime_to_iso(t)),
            FieldValue::StrList(items) => items.iter().cloned().map(Value::String).collect(),
            FieldValue::BoolList(items) => items.iter().copied().map(Value::Bool).collect(),
            FieldValue::IntList(items) => items.iter().copied().map(Value::from).collect(),
            FieldValue::DoubleList(items) => items.iter().copied().map(Value::from).collect(),
            FieldValue::FloatList(items) => {
                items.iter().map(|v| Value::from(*v as f64)).collect()
            }
            FieldValue::LongList(items) => items.iter().copied().map(Value::from).collect(),
            FieldValue::UuidList(items) => {
                items.iter().map(|u| Value::String(u.to_string())).collect()
            }
            FieldValue::BytesList(items) => {
                items.iter().map(|b| Value::String(BASE64.encode(b))).collect()
            }
            FieldValue::DatetimeList(items) => {
                items.iter().map(|t| Value::String(datetime_to_iso(t))).collect()
            }
            FieldValue::Doc(doc) => Value::Object(doc.to_suffix_map()),
            FieldValue::UntypedMap(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            FieldValue::ValueMap(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            FieldValue::DocList(docs) => docs
                .iter()
                .map(|d| Value::Object(d.to_suffix_map()))
                .collect(),
            FieldValue::UntypedMapList(maps) => maps
                .iter()
                .map(|m| Value::Object(m.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
                .collect(),
            FieldValue::ValueMapList(maps) => maps
                .iter()
                .map(|m| {
                    Value::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
                })
                .collect(),
        }
    }

    /// Elements of a list variant, each rewrapped as loose input for
    /// element-wise recoercion. `None` for scalars and composites.
    fn elements(&self) -> Option<Vec<RawValue>> {
        let typed = |v: FieldValue| RawValue::Typed(v);
        Some(match self {
            FieldValue::StrList(items) => {
                items.iter().cloned().map(FieldValue::Str).map(typed).collect()
            }
            FieldValue::BoolList(items) => {
                items.iter().copied().map(FieldValue::Bool).map(typed).collect()
            }
            FieldValue::IntList(items) => {
                items.iter().copied().map(FieldValue::Int).map(typed).collect()
            }
            FieldValue::DoubleList(items) => {
                items.iter().copied().map(FieldValue::Double).map(typed).collect()
            }
            FieldValue::FloatList(items) => {
                items.iter().copied().map(FieldValue::Float).map(typed).collect()
            }
            FieldValue::LongList(items) => {
                items.iter().copied().map(FieldValue::Long).map(typed).collect()
            }
            FieldValue::UuidList(items) => {
                items.iter().copied().map(FieldValue::Uuid).map(typed).collect()
            }
            FieldValue::BytesList(items) => {
                items.iter().cloned().map(FieldValue::Bytes).map(typed).collect()
            }
            FieldValue::DatetimeList(items) => {
                items.iter().copied().map(FieldValue::Datetime).map(typed).collect()
            }
            FieldValue::DocList(items) => {
                items.iter().cloned().map(FieldValue::Doc).map(typed).collect()
            }
            FieldValue::UntypedMapList(items) => items
                .iter()
                .cloned()
                .map(FieldValue::UntypedMap)
                .map(typed)
                .collect(),
            FieldValue::ValueMapList(items) => items
                .iter()
                .cloned()
                .map(FieldValue::ValueMap)
                .map(typed)
                .collect(),
            _ => return None,
        })
    }
}

/// ISO-8601 offset rendering used on the wire and in suffix-coded JSON.
pub fn datetime_to_iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Loose input accepted by [`TypeKind::coerce`]: either an already-typed
/// value (possibly of a different kind, re-coerced) or raw JSON.
#[derive(Debug, Clone)]
pub enum RawValue {
    Typed(FieldValue),
    Json(Value),
}

impl RawValue {
    fn describe(&self) -> String {
        match self {
            RawValue::Typed(v) => format!("{}({:?})", v.kind(), v),
            RawValue::Json(v) => v.to_string(),
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Typed(FieldValue::Str(s)) => Some(s),
            RawValue::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<FieldValue> for RawValue {
    fn from(v: FieldValue) -> Self {
        RawValue::Typed(v)
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        RawValue::Json(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Typed(FieldValue::Str(v.to_string()))
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Typed(FieldValue::Str(v))
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Typed(FieldValue::Bool(v))
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Typed(FieldValue::Int(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Typed(FieldValue::Long(v))
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Typed(FieldValue::Float(v))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Typed(FieldValue::Double(v))
    }
}

impl From<Uuid> for RawValue {
    fn from(v: Uuid) -> Self {
        RawValue::Typed(FieldValue::Uuid(v))
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(v: Vec<u8>) -> Self {
        RawValue::Typed(FieldValue::Bytes(v))
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(v: DateTime<Utc>) -> Self {
        RawValue::Typed(FieldValue::Datetime(v))
    }
}

impl From<Document> for RawValue {
    fn from(v: Document) -> Self {
        RawValue::Typed(FieldValue::Doc(v))
    }
}

impl From<Vec<String>> for RawValue {
    fn from(v: Vec<String>) -> Self {
        RawValue::Typed(FieldValue::StrList(v))
    }
}

impl From<Vec<&str>> for RawValue {
    fn from(v: Vec<&str>) -> Self {
        RawValue::Typed(FieldValue::StrList(v.into_iter().map(String::from).collect()))
    }
}

impl From<Vec<i64>> for RawValue {
    fn from(v: Vec<i64>) -> Self {
        RawValue::Typed(FieldValue::LongList(v))
    }
}

impl From<Vec<Document>> for RawValue {
    fn from(v: Vec<Document>) -> Self {
        RawValue::Typed(FieldValue::DocList(v))
    }
}

enum Num {
    I(i64),
    F(f64),
}

fn as_num(raw: &RawValue) -> Option<Num> {
    match raw {
        RawValue::Typed(FieldValue::Int(v)) => Some(Num::I(*v as i64)),
        RawValue::Typed(FieldValue::Long(v)) => Some(Num::I(*v)),
        RawValue::Typed(FieldValue::Float(v)) => Some(Num::F(*v as f64)),
        RawValue::Typed(FieldValue::Double(v)) => Some(Num::F(*v)),
        RawValue::Json(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Some(Num::I(i))
            } else if let Some(u) = n.as_u64() {
                Some(Num::I(u as i64))
            } else {
                n.as_f64().map(Num::F)
            }
        }
        _ => None,
    }
}

impl TypeKind {
    /// Coerce loose input into this kind's [`FieldValue`] variant.
    pub fn coerce(self, raw: impl Into<RawValue>) -> Result<FieldValue, CoercionError> {
        let raw = raw.into();
        match self {
            TypeKind::String => coerce_string(&raw).map(FieldValue::Str),
            TypeKind::Boolean => coerce_bool(self, &raw).map(FieldValue::Bool),
            TypeKind::Int => coerce_i32(self, &raw).map(FieldValue::Int),
            TypeKind::Double => coerce_f64(self, &raw).map(FieldValue::Double),
            TypeKind::Float => coerce_f32(self, &raw).map(FieldValue::Float),
            TypeKind::Long => coerce_i64(self, &raw).map(FieldValue::Long),
            TypeKind::Uuid => coerce_uuid(self, &raw).map(FieldValue::Uuid),
            TypeKind::Bytes => coerce_bytes(self, &raw).map(FieldValue::Bytes),
            TypeKind::Datetime => coerce_datetime(self, &raw).map(FieldValue::Datetime),
            TypeKind::StringList => {
                coerce_list(&raw, coerce_string).map(FieldValue::StrList)
            }
            TypeKind::BooleanList => {
                coerce_list(&raw, |r| coerce_bool(self, r)).map(FieldValue::BoolList)
            }
            TypeKind::IntList => {
                coerce_list(&raw, |r| coerce_i32(self, r)).map(FieldValue::IntList)
            }
            TypeKind::DoubleList => {
                coerce_list(&raw, |r| coerce_f64(self, r)).map(FieldValue::DoubleList)
            }
            TypeKind::FloatList => {
                coerce_list(&raw, |r| coerce_f32(self, r)).map(FieldValue::FloatList)
            }
            TypeKind::LongList => {
                coerce_list(&raw, |r| coerce_i64(self, r)).map(FieldValue::LongList)
            }
            TypeKind::UuidList => {
                coerce_list(&raw, |r| coerce_uuid(self, r)).map(FieldValue::UuidList)
            }
            TypeKind::BytesList => {
                coerce_list(&raw, |r| coerce_bytes(self, r)).map(FieldValue::BytesList)
            }
            TypeKind::DatetimeList => {
                coerce_list(&raw, |r| coerce_datetime(self, r)).map(FieldValue::DatetimeList)
            }
            TypeKind::Document => coerce_document(self, &raw).map(FieldValue::Doc),
            TypeKind::UntypedMap => coerce_untyped_map(self, &raw).map(FieldValue::UntypedMap),
            TypeKind::ValueMap => coerce_value_map(self, &raw).map(FieldValue::ValueMap),
            TypeKind::DocumentList => {
                coerce_composite_list(&raw, |r| coerce_document(self, r))
                    .map(FieldValue::DocList)
                    .map_err(|_| CoercionError::incompatible(self, &raw))
            }
            TypeKind::UntypedMapList => {
                coerce_composite_list(&raw, |r| coerce_untyped_map(self, r))
                    .map(FieldValue::UntypedMapList)
                    .map_err(|_| CoercionError::incompatible(self, &raw))
            }
            TypeKind::ValueMapList => {
                coerce_composite_list(&raw, |r| coerce_value_map(self, r))
                    .map(FieldValue::ValueMapList)
                    .map_err(|_| CoercionError::incompatible(self, &raw))
            }
        }
    }
}

fn coerce_string(raw: &RawValue) -> Result<String, CoercionError> {
    Ok(match raw {
        RawValue::Typed(FieldValue::Str(s)) => s.clone(),
        RawValue::Typed(FieldValue::Bool(b)) => b.to_string(),
        RawValue::Typed(FieldValue::Int(v)) => v.to_string(),
        RawValue::Typed(FieldValue::Long(v)) => v.to_string(),
        RawValue::Typed(FieldValue::Float(v)) => v.to_string(),
        RawValue::Typed(FieldValue::Double(v)) => v.to_string(),
        RawValue::Typed(FieldValue::Uuid(u)) => u.to_string(),
        RawValue::Typed(FieldValue::Bytes(b)) => BASE64.encode(b),
        RawValue::Typed(FieldValue::Datetime(t)) => datetime_to_iso(t),
        RawValue::Typed(other) => other.to_json().to_string(),
        RawValue::Json(Value::String(s)) => s.clone(),
        RawValue::Json(other) => other.to_string(),
    })
}

/// Single-character strings use the compact convention: `F` and `0`
/// (case-insensitive) are false, any other single character is true.
/// Multi-character strings must be a boolean literal.
fn coerce_bool(kind: TypeKind, raw: &RawValue) -> Result<bool, CoercionError> {
    if let RawValue::Typed(FieldValue::Bool(b)) = raw {
        return Ok(*b);
    }
    if let RawValue::Json(Value::Bool(b)) = raw {
        return Ok(*b);
    }
    if let Some(num) = as_num(raw) {
        return Ok(match num {
            Num::I(i) => i != 0,
            Num::F(f) => f != 0.0,
        });
    }
    if let Some(s) = raw.as_str() {
        let mut chars = s.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            return Ok(!(first.eq_ignore_ascii_case(&'f') || first == '0'));
        }
        return match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(CoercionError::value(kind, raw)),
        };
    }
    Err(CoercionError::value(kind, raw))
}

fn coerce_i32(kind: TypeKind, raw: &RawValue) -> Result<i32, CoercionError> {
    if let Some(num) = as_num(raw) {
        return Ok(match num {
            Num::I(i) => i as i32,
            Num::F(f) => f as i32,
        });
    }
    if let Some(s) = raw.as_str() {
        return s.parse().map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

fn coerce_i64(kind: TypeKind, raw: &RawValue) -> Result<i64, CoercionError> {
    if let Some(num) = as_num(raw) {
        return Ok(match num {
            Num::I(i) => i,
            Num::F(f) => f as i64,
        });
    }
    if let Some(s) = raw.as_str() {
        return s.parse().map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

/// Decimal strings may use a comma as the decimal separator.
fn coerce_f32(kind: TypeKind, raw: &RawValue) -> Result<f32, CoercionError> {
    if let Some(num) = as_num(raw) {
        return Ok(match num {
            Num::I(i) => i as f32,
            Num::F(f) => f as f32,
        });
    }
    if let Some(s) = raw.as_str() {
        return s
            .replace(',', ".")
            .parse()
            .map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

fn coerce_f64(kind: TypeKind, raw: &RawValue) -> Result<f64, CoercionError> {
    if let Some(num) = as_num(raw) {
        return Ok(match num {
            Num::I(i) => i as f64,
            Num::F(f) => f,
        });
    }
    if let Some(s) = raw.as_str() {
        return s
            .replace(',', ".")
            .parse()
            .map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

/// Numeric array elements are truncated to bytes; strings are Base64.
fn coerce_bytes(kind: TypeKind, raw: &RawValue) -> Result<Vec<u8>, CoercionError> {
    if let RawValue::Typed(FieldValue::Bytes(b)) = raw {
        return Ok(b.clone());
    }
    if let Some(elements) = raw_elements(raw) {
        return elements
            .iter()
            .map(|e| match as_num(e) {
                Some(Num::I(i)) => Ok(i as u8),
                Some(Num::F(f)) => Ok(f as i64 as u8),
                None => Err(CoercionError::value(kind, raw)),
            })
            .collect();
    }
    if let Some(s) = raw.as_str() {
        return BASE64
            .decode(s)
            .map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

/// Integers are epoch milliseconds; strings are ISO-8601 instants.
fn coerce_datetime(kind: TypeKind, raw: &RawValue) -> Result<DateTime<Utc>, CoercionError> {
    if let RawValue::Typed(FieldValue::Datetime(t)) = raw {
        return Ok(*t);
    }
    if let Some(Num::I(millis)) = as_num(raw) {
        return Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| CoercionError::value(kind, raw));
    }
    if let Some(s) = raw.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| CoercionError::value(kind, raw));
    }
    Err(CoercionError::value(kind, raw))
}

fn coerce_uuid(kind: TypeKind, raw: &RawValue) -> Result<Uuid, CoercionError> {
    if let RawValue::Typed(FieldValue::Uuid(u)) = raw {
        return Ok(*u);
    }
    if let Some(s) = raw.as_str() {
        if s.len() == 36 {
            return Uuid::parse_str(s).map_err(|_| CoercionError::value(kind, raw));
        }
    }
    Err(CoercionError::value(kind, raw))
}

fn raw_elements(raw: &RawValue) -> Option<Vec<RawValue>> {
    match raw {
        RawValue::Json(Value::Array(items)) => {
            Some(items.iter().cloned().map(RawValue::Json).collect())
        }
        RawValue::Typed(v) => v.elements(),
        _ => None,
    }
}

/// List coercion: collections go element-wise; a `[a,b,c]`-shaped or
/// comma-containing string is split; any other scalar becomes a
/// single-element list. The bracket form strips whitespace, the bare
/// comma form does not.
fn coerce_list<T>(
    raw: &RawValue,
    elem: impl Fn(&RawValue) -> Result<T, CoercionError>,
) -> Result<Vec<T>, CoercionError> {
    if let Some(elements) = raw_elements(raw) {
        return elements.iter().map(&elem).collect();
    }
    if let Some(s) = raw.as_str() {
        let trimmed = s.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let inner: String = trimmed
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '[' && *c != ']')
                .collect();
            if inner.is_empty() {
                return Ok(Vec::new());
            }
            return inner.split(',').map(|p| elem(&RawValue::from(p))).collect();
        }
        if s.contains(',') {
            return s.split(',').map(|p| elem(&RawValue::from(p))).collect();
        }
    }
    Ok(vec![elem(raw)?])
}

fn coerce_composite_list<T>(
    raw: &RawValue,
    elem: impl Fn(&RawValue) -> Result<T, CoercionError>,
) -> Result<Vec<T>, CoercionError> {
    match raw_elements(raw) {
        Some(elements) => elements.iter().map(&elem).collect(),
        None => Ok(vec![elem(raw)?]),
    }
}

fn coerce_document(kind: TypeKind, raw: &RawValue) -> Result<Document, CoercionError> {
    match raw {
        RawValue::Typed(FieldValue::Doc(d)) => Ok(d.clone()),
        _ => Err(CoercionError::incompatible(kind, raw)),
    }
}

fn coerce_untyped_map(
    kind: TypeKind,
    raw: &RawValue,
) -> Result<IndexMap<String, Value>, CoercionError> {
    match raw {
        RawValue::Typed(FieldValue::UntypedMap(m)) => Ok(m.clone()),
        RawValue::Json(Value::Object(m)) => {
            Ok(m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        }
        _ => Err(CoercionError::incompatible(kind, raw)),
    }
}

fn coerce_value_map(
    kind: TypeKind,
    raw: &RawValue,
) -> Result<IndexMap<String, FieldValue>, CoercionError> {
    match raw {
        RawValue::Typed(FieldValue::ValueMap(m)) => Ok(m.clone()),
        _ => Err(CoercionError::incompatible(kind, raw)),
    }
}

/// Infer the most specific kind a loose JSON value can carry. Used by
/// the plain codec when it meets a field name with no cached kind.
pub fn detect_kind(value: &Value) -> TypeKind {
    match value {
        Value::Bool(_) => TypeKind::Boolean,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i32::try_from(i).is_ok() {
                    TypeKind::Int
                } else {
                    TypeKind::Long
                }
            } else {
                TypeKind::Double
            }
        }
        Value::Array(items) => match items.first() {
            Some(first) => detect_kind(first).list_kind().unwrap_or(TypeKind::StringList),
            None => TypeKind::StringList,
        },
        Value::Object(_) => TypeKind::UntypedMap,
        _ => TypeKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn string_accepts_anything_displayable() {
        assert_eq!(
            TypeKind::String.coerce("hello").unwrap(),
            FieldValue::Str("hello".into())
        );
        assert_eq!(
            TypeKind::String.coerce(42i64).unwrap(),
            FieldValue::Str("42".into())
        );
        assert_eq!(
            TypeKind::String.coerce(true).unwrap(),
            FieldValue::Str("true".into())
        );
    }

    #[test]
    fn boolean_single_char_convention() {
        assert_eq!(TypeKind::Boolean.coerce("F").unwrap(), FieldValue::Bool(false));
        assert_eq!(TypeKind::Boolean.coerce("f").unwrap(), FieldValue::Bool(false));
        assert_eq!(TypeKind::Boolean.coerce("0").unwrap(), FieldValue::Bool(false));
        assert_eq!(TypeKind::Boolean.coerce("T").unwrap(), FieldValue::Bool(true));
        assert_eq!(TypeKind::Boolean.coerce("y").unwrap(), FieldValue::Bool(true));
        assert_eq!(TypeKind::Boolean.coerce("1").unwrap(), FieldValue::Bool(true));
    }

    #[test]
    fn boolean_literals_and_numbers() {
        assert_eq!(TypeKind::Boolean.coerce("TRUE").unwrap(), FieldValue::Bool(true));
        assert_eq!(TypeKind::Boolean.coerce("false").unwrap(), FieldValue::Bool(false));
        assert_eq!(TypeKind::Boolean.coerce(0i64).unwrap(), FieldValue::Bool(false));
        assert_eq!(TypeKind::Boolean.coerce(-3i32).unwrap(), FieldValue::Bool(true));
        assert!(TypeKind::Boolean.coerce("maybe").is_err());
    }

    #[test]
    fn numeric_narrowing_and_widening() {
        assert_eq!(TypeKind::Int.coerce(7i64).unwrap(), FieldValue::Int(7));
        assert_eq!(TypeKind::Long.coerce(7i32).unwrap(), FieldValue::Long(7));
        assert_eq!(TypeKind::Int.coerce(3.9f64).unwrap(), FieldValue::Int(3));
        assert_eq!(TypeKind::Double.coerce(5i64).unwrap(), FieldValue::Double(5.0));
        assert_eq!(TypeKind::Long.coerce("123").unwrap(), FieldValue::Long(123));
        assert!(TypeKind::Int.coerce("12.5").is_err());
    }

    #[test]
    fn decimal_strings_accept_comma_separator() {
        assert_eq!(
            TypeKind::Double.coerce("3,14").unwrap(),
            FieldValue::Double(3.14)
        );
        assert_eq!(
            TypeKind::Float.coerce("2,5").unwrap(),
            FieldValue::Float(2.5)
        );
        assert!(TypeKind::Double.coerce("not a number").is_err());
    }

    #[test]
    fn bytes_from_base64_and_numeric_arrays() {
        assert_eq!(
            TypeKind::Bytes.coerce("aGVsbG8=").unwrap(),
            FieldValue::Bytes(b"hello".to_vec())
        );
        assert_eq!(
            TypeKind::Bytes.coerce(serde_json::json!([104, 105, 300])).unwrap(),
            FieldValue::Bytes(vec![104, 105, 44]) // 300 truncates to 44
        );
        assert!(TypeKind::Bytes.coerce("!!!not base64!!!").is_err());
    }

    #[test]
    fn datetime_from_millis_and_iso() {
        let t = dt("2026-03-01T12:00:00Z");
        assert_eq!(
            TypeKind::Datetime.coerce(t.timestamp_millis()).unwrap(),
            FieldValue::Datetime(t)
        );
        assert_eq!(
            TypeKind::Datetime.coerce("2026-03-01T12:00:00Z").unwrap(),
            FieldValue::Datetime(t)
        );
        assert!(TypeKind::Datetime.coerce("yesterday").is_err());
    }

    #[test]
    fn uuid_requires_canonical_form() {
        let u = Uuid::new_v4();
        assert_eq!(
            TypeKind::Uuid.coerce(u.to_string()).unwrap(),
            FieldValue::Uuid(u)
        );
        assert!(TypeKind::Uuid.coerce("not-a-uuid").is_err());
    }

    #[test]
    fn lists_wrap_scalars_and_split_strings() {
        assert_eq!(
            TypeKind::StringList.coerce("solo").unwrap(),
            FieldValue::StrList(vec!["solo".into()])
        );
        assert_eq!(
            TypeKind::IntList.coerce("[1, 2, 3]").unwrap(),
            FieldValue::IntList(vec![1, 2, 3])
        );
        assert_eq!(
            TypeKind::LongList.coerce("4,5,6").unwrap(),
            FieldValue::LongList(vec![4, 5, 6])
        );
        assert_eq!(
            TypeKind::StringList.coerce(serde_json::json!(["a", "b"])).unwrap(),
            FieldValue::StrList(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn list_elements_recoerce_across_kinds() {
        assert_eq!(
            TypeKind::StringList
                .coerce(FieldValue::LongList(vec![1, 2]))
                .unwrap(),
            FieldValue::StrList(vec!["1".into(), "2".into()])
        );
    }

    #[test]
    fn composites_reject_foreign_shapes() {
        let err = TypeKind::Document.coerce("a plain string").unwrap_err();
        assert!(matches!(err, CoercionError::Incompatible { .. }));

        let err = TypeKind::ValueMap.coerce(serde_json::json!({"k": 1})).unwrap_err();
        assert!(matches!(err, CoercionError::Incompatible { .. }));
    }

    #[test]
    fn untyped_map_accepts_json_objects() {
        let v = TypeKind::UntypedMap
            .coerce(serde_json::json!({"b": 1, "a": 2}))
            .unwrap();
        match v {
            FieldValue::UntypedMap(m) => {
                let keys: Vec<_> = m.keys().cloned().collect();
                assert_eq!(keys, vec!["b", "a"]); // source order preserved
            }
            other => panic!("expected untyped map, got {other:?}"),
        }
    }

    #[test]
    fn detect_kind_infers_from_json_shape() {
        assert_eq!(detect_kind(&serde_json::json!("x")), TypeKind::String);
        assert_eq!(detect_kind(&serde_json::json!(true)), TypeKind::Boolean);
        assert_eq!(detect_kind(&serde_json::json!(7)), TypeKind::Int);
        assert_eq!(detect_kind(&serde_json::json!(1u64 << 40)), TypeKind::Long);
        assert_eq!(detect_kind(&serde_json::json!(1.5)), TypeKind::Double);
        assert_eq!(detect_kind(&serde_json::json!([1, 2])), TypeKind::IntList);
        assert_eq!(detect_kind(&serde_json::json!([])), TypeKind::StringList);
        assert_eq!(detect_kind(&serde_json::json!({"a": 1})), TypeKind::UntypedMap);
    }
}
