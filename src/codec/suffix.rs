// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Self-describing names: the kind rides in a `_suffix` token.

use std::collections::HashMap;

use crate::codec::FieldCodec;
use crate::field::{Field, TypeKind};

/// Kind/suffix table. Every kind has a token, so encode/decode round-trip
/// for any name that does not itself end in a registered token.
const SUFFIXES: &[(TypeKind, &str)] = &[
    (TypeKind::String, "s"),
    (TypeKind::StringList, "ss"),
    (TypeKind::Int, "i"),
    (TypeKind::IntList, "is"),
    (TypeKind::Long, "l"),
    (TypeKind::LongList, "ls"),
    (TypeKind::Boolean, "b"),
    (TypeKind::BooleanList, "bs"),
    (TypeKind::Float, "f"),
    (TypeKind::FloatList, "fs"),
    (TypeKind::Double, "d"),
    (TypeKind::DoubleList, "ds"),
    (TypeKind::Datetime, "dt"),
    (TypeKind::DatetimeList, "dts"),
    (TypeKind::Uuid, "uid"),
    (TypeKind::UuidList, "uids"),
    (TypeKind::Bytes, "bin"),
    (TypeKind::BytesList, "bins"),
    (TypeKind::Document, "obj"),
    (TypeKind::DocumentList, "objs"),
    (TypeKind::UntypedMap, "map"),
    (TypeKind::UntypedMapList, "maps"),
    (TypeKind::ValueMap, "vmap"),
    (TypeKind::ValueMapList, "vmaps"),
];

/// Codec carrying the kind as `<name>_<suffix>`.
///
/// Decoding splits at the LAST underscore: a registered token there names
/// the kind and the rest is the field name; anything else leaves the full
/// name intact with the default kind. The split point makes decoding
/// deterministic even for names that contain underscores of their own.
#[derive(Debug)]
pub struct SuffixCodec {
    by_kind: HashMap<TypeKind, &'static str>,
    by_suffix: HashMap<&'static str, TypeKind>,
    default_kind: TypeKind,
}

impl Default for SuffixCodec {
    fn default() -> Self {
        SuffixCodec::new(TypeKind::String)
    }
}

impl SuffixCodec {
    pub fn new(default_kind: TypeKind) -> Self {
        SuffixCodec {
            by_kind: SUFFIXES.iter().copied().collect(),
            by_suffix: SUFFIXES.iter().map(|(k, s)| (*s, *k)).collect(),
            default_kind,
        }
    }

    pub fn suffix_of(&self, kind: TypeKind) -> &'static str {
        self.by_kind.get(&kind).copied().unwrap_or("s")
    }
}

impl FieldCodec for SuffixCodec {
    fn encode(&self, field: &Field) -> String {
        format!("{}_{}", field.name(), self.suffix_of(field.kind()))
    }

    fn decode(&self, name: &str) -> Field {
        if let Some((base, token)) = name.rsplit_once('_') {
            if !base.is_empty() {
                let token = token.to_ascii_lowercase();
                if let Some(kind) = self.by_suffix.get(token.as_str()) {
                    return Field::new(base, *kind);
                }
            }
        }
        Field::new(name, self.default_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_kind() {
        let codec = SuffixCodec::default();
        for kind in TypeKind::ALL {
            let field = Field::new("subject", kind);
            let encoded = codec.encode(&field);
            assert_eq!(codec.decode(&encoded), field, "kind {kind}");
        }
    }

    #[test]
    fn round_trips_names_with_underscores() {
        let codec = SuffixCodec::default();
        let field = Field::new("date_modified", TypeKind::Datetime);
        let encoded = codec.encode(&field);
        assert_eq!(encoded, "date_modified_dt");
        assert_eq!(codec.decode(&encoded), field);
    }

    #[test]
    fn unknown_suffix_keeps_full_name_with_default_kind() {
        let codec = SuffixCodec::default();
        assert_eq!(codec.decode("hello_world"), Field::string("hello_world"));
        assert_eq!(codec.decode("plain"), Field::string("plain"));
    }

    #[test]
    fn suffix_match_is_case_insensitive() {
        let codec = SuffixCodec::default();
        assert_eq!(
            codec.decode("created_DT"),
            Field::new("created", TypeKind::Datetime)
        );
    }

    #[test]
    fn configurable_default_kind() {
        let codec = SuffixCodec::new(TypeKind::Long);
        assert_eq!(codec.decode("plain"), Field::new("plain", TypeKind::Long));
    }
}
