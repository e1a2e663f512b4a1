// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The closed set of value kinds a field can carry.
//!
//! Kind ids are wire-stable: they are persisted in cursors and used by
//! codecs, so the numbering is contiguous and append-only. `from_id`
//! rejects anything outside `0..24`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when a kind id or name cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindError {
    /// Kind id outside the closed range.
    #[error("type kind id {0} is out of range 0..{max}", max = TypeKind::COUNT)]
    OutOfRange(u8),

    /// Kind name not in the registry.
    #[error("unknown type kind name: {0}")]
    UnknownName(String),
}

/// The closed registry of field value kinds.
///
/// Nine scalar kinds, their nine list counterparts, three composite kinds
/// and their three list counterparts. The discriminants are the stable ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TypeKind {
    String = 0,
    Boolean = 1,
    Int = 2,
    Double = 3,
    Float = 4,
    Long = 5,
    Uuid = 6,
    Bytes = 7,
    Datetime = 8,
    StringList = 9,
    BooleanList = 10,
    IntList = 11,
    DoubleList = 12,
    FloatList = 13,
    LongList = 14,
    UuidList = 15,
    BytesList = 16,
    DatetimeList = 17,
    Document = 18,
    UntypedMap = 19,
    ValueMap = 20,
    DocumentList = 21,
    UntypedMapList = 22,
    ValueMapList = 23,
}

impl TypeKind {
    /// Number of registered kinds.
    pub const COUNT: u8 = 24;

    /// All kinds in id order. The position of each entry equals its id;
    /// `registry_is_contiguous` in the tests guards that invariant.
    pub const ALL: [TypeKind; Self::COUNT as usize] = [
        TypeKind::String,
        TypeKind::Boolean,
        TypeKind::Int,
        TypeKind::Double,
        TypeKind::Float,
        TypeKind::Long,
        TypeKind::Uuid,
        TypeKind::Bytes,
        TypeKind::Datetime,
        TypeKind::StringList,
        TypeKind::BooleanList,
        TypeKind::IntList,
        TypeKind::DoubleList,
        TypeKind::FloatList,
        TypeKind::LongList,
        TypeKind::UuidList,
        TypeKind::BytesList,
        TypeKind::DatetimeList,
        TypeKind::Document,
        TypeKind::UntypedMap,
        TypeKind::ValueMap,
        TypeKind::DocumentList,
        TypeKind::UntypedMapList,
        TypeKind::ValueMapList,
    ];

    /// Stable numeric id of this kind.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Resolve a kind from its stable id.
    pub fn from_id(id: u8) -> Result<TypeKind, KindError> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(KindError::OutOfRange(id))
    }

    /// Canonical short name, used by codecs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Int => "int",
            TypeKind::Double => "double",
            TypeKind::Float => "float",
            TypeKind::Long => "long",
            TypeKind::Uuid => "uuid",
            TypeKind::Bytes => "bytes",
            TypeKind::Datetime => "datetime",
            TypeKind::StringList => "strings",
            TypeKind::BooleanList => "booleans",
            TypeKind::IntList => "ints",
            TypeKind::DoubleList => "doubles",
            TypeKind::FloatList => "floats",
            TypeKind::LongList => "longs",
            TypeKind::UuidList => "uuids",
            TypeKind::BytesList => "bytes_list",
            TypeKind::DatetimeList => "datetimes",
            TypeKind::Document => "document",
            TypeKind::UntypedMap => "untyped_map",
            TypeKind::ValueMap => "value_map",
            TypeKind::DocumentList => "documents",
            TypeKind::UntypedMapList => "untyped_maps",
            TypeKind::ValueMapList => "value_maps",
        }
    }

    /// Resolve a kind from its canonical name.
    pub fn parse_name(name: &str) -> Result<TypeKind, KindError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| KindError::UnknownName(name.to_string()))
    }

    /// Whether this kind holds multiple values.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            TypeKind::StringList
                | TypeKind::BooleanList
                | TypeKind::IntList
                | TypeKind::DoubleList
                | TypeKind::FloatList
                | TypeKind::LongList
                | TypeKind::UuidList
                | TypeKind::BytesList
                | TypeKind::DatetimeList
                | TypeKind::DocumentList
                | TypeKind::UntypedMapList
                | TypeKind::ValueMapList
        )
    }

    /// Whether this kind is a composite (document, map, or a list of those).
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TypeKind::Document
                | TypeKind::UntypedMap
                | TypeKind::ValueMap
                | TypeKind::DocumentList
                | TypeKind::UntypedMapList
                | TypeKind::ValueMapList
        )
    }

    /// The list counterpart of a scalar/composite kind, if one exists.
    pub fn list_kind(self) -> Option<TypeKind> {
        match self {
            TypeKind::String => Some(TypeKind::StringList),
            TypeKind::Boolean => Some(TypeKind::BooleanList),
            TypeKind::Int => Some(TypeKind::IntList),
            TypeKind::Double => Some(TypeKind::DoubleList),
            TypeKind::Float => Some(TypeKind::FloatList),
            TypeKind::Long => Some(TypeKind::LongList),
            TypeKind::Uuid => Some(TypeKind::UuidList),
            TypeKind::Bytes => Some(TypeKind::BytesList),
            TypeKind::Datetime => Some(TypeKind::DatetimeList),
            TypeKind::Document => Some(TypeKind::DocumentList),
            TypeKind::UntypedMap => Some(TypeKind::UntypedMapList),
            TypeKind::ValueMap => Some(TypeKind::ValueMapList),
            _ => None,
        }
    }

    /// The element kind of a list kind, if this is a list.
    pub fn element_kind(self) -> Option<TypeKind> {
        match self {
            TypeKind::StringList => Some(TypeKind::String),
            TypeKind::BooleanList => Some(TypeKind::Boolean),
            TypeKind::IntList => Some(TypeKind::Int),
            TypeKind::DoubleList => Some(TypeKind::Double),
            TypeKind::FloatList => Some(TypeKind::Float),
            TypeKind::LongList => Some(TypeKind::Long),
            TypeKind::UuidList => Some(TypeKind::Uuid),
            TypeKind::BytesList => Some(TypeKind::Bytes),
            TypeKind::DatetimeList => Some(TypeKind::Datetime),
            TypeKind::DocumentList => Some(TypeKind::Document),
            TypeKind::UntypedMapList => Some(TypeKind::UntypedMap),
            TypeKind::ValueMapList => Some(TypeKind::ValueMap),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
