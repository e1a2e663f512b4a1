// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fields: named, kinded document keys.
//!
//! A field's identity is the pair (name, kind). Two fields with the same
//! name but different kinds are different fields — equality and hashing
//! cover both components, which is what lets a document hold `count:int`
//! and `count:string` side by side without ambiguity.

mod kind;
mod value;

pub use kind::{KindError, TypeKind};
pub use value::{datetime_to_iso, detect_kind, CoercionError, FieldValue, RawValue};

use serde::{Deserialize, Serialize};

/// A typed document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    name: String,
    kind: TypeKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Field {
            name: name.into(),
            kind,
        }
    }

    /// Shorthand for a string-kinded field.
    pub fn string(name: impl Into<String>) -> Self {
        Field::new(name, TypeKind::String)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}

/// Catalog of well-known fields shared by sources and the sync engine.
pub mod known {
    use super::{Field, TypeKind};
    use once_cell::sync::Lazy;

    macro_rules! known_field {
        ($ident:ident, $name:literal, $kind:ident) => {
            pub static $ident: Lazy<Field> =
                Lazy::new(|| Field::new($name, TypeKind::$kind));
        };
    }

    // Identity
    known_field!(ID, "id", String);
    known_field!(GUID, "guid", String);
    known_field!(VERSION_SERIES_ID, "vs_id", String);

    // Descriptive
    known_field!(TITLE, "title", String);
    known_field!(DESCRIPTION, "description", String);
    known_field!(CLASS_NAME, "class_name", String);
    known_field!(MIME_TYPE, "mime_type", String);
    known_field!(FILE_EXTENSION, "file_extension", String);

    // Timestamps and principals
    known_field!(MODIFY_DATETIME, "date_modified", Datetime);
    known_field!(CREATE_DATETIME, "date_created", Datetime);
    known_field!(ADDED_DATETIME, "date_added", Datetime);
    known_field!(CREATOR, "creator", String);
    known_field!(LAST_MODIFIER, "last_modifier", String);

    // Content
    known_field!(CONTENT, "content", String);
    known_field!(CONTENT_ID, "content_id", String);
    known_field!(CONTENT_STATUS, "content_status", String);
    known_field!(CONTENT_SIZE, "content_size", Long);
    known_field!(CONTENT_BYTES, "content_bytes", Bytes);

    // Hierarchy
    known_field!(PARENT_ID, "parent_id", String);
    known_field!(CHILDREN, "children", DocumentList);
    known_field!(IS_FOLDER, "is_folder", Boolean);
    known_field!(FOLDER_PATH, "folder_path", String);
    known_field!(FOLDER_PATHS, "folder_paths", StringList);
    known_field!(PATHS, "paths", StringList);

    // Source/target routing
    known_field!(SOURCE_ID, "source_id", String);
    known_field!(TARGET_ID, "target_id", String);

    // Versioning
    known_field!(VERSION_NUMBER, "version", String);
    known_field!(IS_CURRENT_VERSION, "is_current_version", Boolean);
    known_field!(IS_RESERVED, "is_reserved", Boolean);
    known_field!(IS_COMPOUND, "is_compound", Boolean);

    // Annotation geometry
    known_field!(TOP, "top", Double);
    known_field!(LEFT, "left", Double);
    known_field!(WIDTH, "width", Double);
    known_field!(HEIGHT, "height", Double);
    known_field!(TOOLTIP, "tooltip", String);
    known_field!(PAGE_NUMBER, "page_number", Int);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_covers_name_and_kind() {
        let a = Field::new("count", TypeKind::Int);
        let b = Field::new("count", TypeKind::String);
        let c = Field::new("count", TypeKind::Int);
        assert_ne!(a, b);
        assert_eq!(a, c);

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b.clone());
        assert_eq!(set.len(), 2);
        assert!(set.contains(&c));
    }

    #[test]
    fn known_catalog_has_expected_kinds() {
        assert_eq!(known::ID.kind(), TypeKind::String);
        assert_eq!(known::MODIFY_DATETIME.kind(), TypeKind::Datetime);
        assert_eq!(known::CHILDREN.kind(), TypeKind::DocumentList);
        assert_eq!(known::CONTENT_SIZE.kind(), TypeKind::Long);
        assert_eq!(known::IS_FOLDER.kind(), TypeKind::Boolean);
    }
}
