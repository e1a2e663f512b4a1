// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The backend-specialized codec.
//!
//! Index field names must be safe for the backend's dynamic-field
//! machinery, so characters it cannot digest are rewritten as
//! `<code>_` pairs, the kind is appended as the backend's suffix
//! convention, and the reserved system fields pass through untouched.
//! Both directions are cached, so names encoded in-process decode back
//! to the exact original field.

use dashmap::DashMap;

use crate::codec::FieldCodec;
use crate::field::{Field, TypeKind};

/// Characters the backend rejects, paired with their escape codes. Each
/// occurrence is emitted as `<code>_`.
const ESCAPES: &[(char, char)] = &[
    ('@', 'a'),
    ('\\', 'b'),
    (':', 'c'),
    ('$', 'd'),
    ('!', 'e'),
    ('/', 'f'),
    (';', 'i'),
    ('-', 'm'),
    ('*', 's'),
    ('~', 't'),
    (' ', 'v'),
    ('.', 'x'),
];

/// Kind -> dynamic-field suffix. Kinds without an entry (uuid, the
/// composites) carry no suffix and rely on explicit schema fields.
const ENCODE_SUFFIXES: &[(TypeKind, &str)] = &[
    (TypeKind::String, "_s"),
    (TypeKind::Boolean, "_b"),
    (TypeKind::Int, "_i"),
    (TypeKind::Double, "_d"),
    (TypeKind::Float, "_f"),
    (TypeKind::Long, "_l"),
    (TypeKind::Bytes, "_bin"),
    (TypeKind::Datetime, "_dt"),
    (TypeKind::StringList, "_ss"),
    (TypeKind::BooleanList, "_bs"),
    (TypeKind::IntList, "_is"),
    (TypeKind::DoubleList, "_ds"),
    (TypeKind::FloatList, "_fs"),
    (TypeKind::LongList, "_ls"),
    (TypeKind::DatetimeList, "_dts"),
];

/// Suffix -> kind, anchored at the end of the name. Longest tokens first
/// so `_dts` is claimed before `_s` gets a chance.
const DECODE_SUFFIXES: &[(&str, TypeKind)] = &[
    ("_dts", TypeKind::DatetimeList),
    ("_bin", TypeKind::Bytes),
    ("_ss", TypeKind::StringList),
    ("_bs", TypeKind::BooleanList),
    ("_is", TypeKind::IntList),
    ("_ds", TypeKind::DoubleList),
    ("_fs", TypeKind::FloatList),
    ("_ls", TypeKind::LongList),
    ("_dt", TypeKind::Datetime),
    ("_s", TypeKind::String),
    ("_b", TypeKind::Boolean),
    ("_i", TypeKind::Int),
    ("_d", TypeKind::Double),
    ("_f", TypeKind::Float),
    ("_l", TypeKind::Long),
];

/// Reserved names owned by the backend itself. They bypass escaping and
/// suffixing and decode to fixed kinds.
const SYSTEM_FIELDS: &[(&str, TypeKind)] = &[
    ("id", TypeKind::String),
    ("_version_", TypeKind::Long),
    ("_root_", TypeKind::String),
    ("_text_", TypeKind::String),
];

fn escape_code(ch: char) -> Option<char> {
    ESCAPES.iter().find(|(c, _)| *c == ch).map(|(_, code)| *code)
}

fn system_kind(name: &str) -> Option<TypeKind> {
    SYSTEM_FIELDS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, kind)| *kind)
}

/// Backend field-name codec with concurrent encode/decode caches.
#[derive(Debug, Default)]
pub struct IndexCodec {
    encoded: DashMap<Field, String>,
    decoded: DashMap<String, Field>,
}

impl IndexCodec {
    pub fn new() -> Self {
        IndexCodec::default()
    }

    fn escape(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        let mut chars = name.chars().peekable();
        while let Some(ch) = chars.next() {
            // Escape-of-escape: a backslash guarding an escapable char
            // passes that char through verbatim.
            if ch == '\\' {
                if let Some(&next) = chars.peek() {
                    if escape_code(next).is_some() {
                        out.push(next);
                        chars.next();
                        continue;
                    }
                }
            }
            match escape_code(ch) {
                Some(code) => {
                    out.push(code);
                    out.push('_');
                }
                None => out.push(ch),
            }
        }
        out
    }

    fn suffix_of(kind: TypeKind) -> Option<&'static str> {
        ENCODE_SUFFIXES
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, s)| *s)
    }
}

impl FieldCodec for IndexCodec {
    fn encode(&self, field: &Field) -> String {
        if field.name().is_empty() {
            return String::new();
        }
        if system_kind(field.name()).is_some() {
            return field.name().to_string();
        }
        if let Some(cached) = self.encoded.get(field) {
            return cached.clone();
        }
        let mut name = Self::escape(field.name());
        if let Some(suffix) = Self::suffix_of(field.kind()) {
            name.push_str(suffix);
        }
        self.encoded.insert(field.clone(), name.clone());
        self.decoded.insert(name.clone(), field.clone());
        name
    }

    fn decode(&self, name: &str) -> Field {
        if name.is_empty() {
            return Field::string(name);
        }
        if let Some(kind) = system_kind(name) {
            return Field::new(name, kind);
        }
        if let Some(cached) = self.decoded.get(name) {
            return cached.clone();
        }
        for (suffix, kind) in DECODE_SUFFIXES {
            if let Some(base) = name.strip_suffix(suffix) {
                if !base.is_empty() {
                    return Field::new(base, *kind);
                }
            }
        }
        Field::string(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_get_kind_suffixes() {
        let codec = IndexCodec::new();
        assert_eq!(codec.encode(&Field::new("title", TypeKind::String)), "title_s");
        assert_eq!(codec.encode(&Field::new("count", TypeKind::Long)), "count_l");
        assert_eq!(
            codec.encode(&Field::new("tags", TypeKind::StringList)),
            "tags_ss"
        );
        assert_eq!(
            codec.encode(&Field::new("seen", TypeKind::Datetime)),
            "seen_dt"
        );
    }

    #[test]
    fn unsafe_characters_are_escaped() {
        let codec = IndexCodec::new();
        assert_eq!(
            codec.encode(&Field::new("user@mail", TypeKind::String)),
            "usera_mail_s"
        );
        assert_eq!(
            codec.encode(&Field::new("a b.c", TypeKind::Long)),
            "av_bx_c_l"
        );
        assert_eq!(
            codec.encode(&Field::new("semi;colon", TypeKind::Int)),
            "semii_colon_i"
        );
    }

    #[test]
    fn backslash_guards_pass_escapable_chars_through() {
        let codec = IndexCodec::new();
        // "\@" keeps a literal '@'; a lone backslash before a safe char
        // is escaped itself.
        assert_eq!(
            codec.encode(&Field::new("a\\@b", TypeKind::String)),
            "a@b_s"
        );
        assert_eq!(
            codec.encode(&Field::new("a\\zb", TypeKind::String)),
            "ab_zb_s"
        );
    }

    #[test]
    fn system_fields_bypass_everything() {
        let codec = IndexCodec::new();
        assert_eq!(codec.encode(&Field::new("id", TypeKind::String)), "id");
        assert_eq!(
            codec.encode(&Field::new("_version_", TypeKind::Long)),
            "_version_"
        );
        assert_eq!(codec.decode("_version_"), Field::new("_version_", TypeKind::Long));
        assert_eq!(codec.decode("_root_"), Field::new("_root_", TypeKind::String));
    }

    #[test]
    fn decode_takes_the_longest_suffix() {
        let codec = IndexCodec::new();
        assert_eq!(
            codec.decode("stamps_dts"),
            Field::new("stamps", TypeKind::DatetimeList)
        );
        assert_eq!(codec.decode("raw_bin"), Field::new("raw", TypeKind::Bytes));
        assert_eq!(codec.decode("tag_ss"), Field::new("tag", TypeKind::StringList));
        assert_eq!(codec.decode("tag_s"), Field::string("tag"));
    }

    #[test]
    fn decode_without_suffix_defaults_to_string() {
        let codec = IndexCodec::new();
        assert_eq!(codec.decode("opaque"), Field::string("opaque"));
    }

    #[test]
    fn encode_cache_makes_decode_exact() {
        let codec = IndexCodec::new();
        let field = Field::new("user@mail", TypeKind::String);
        let name = codec.encode(&field);
        // Cold decode could not unescape, but the cache recovers the
        // original field exactly.
        assert_eq!(codec.decode(&name), field);
    }

    #[test]
    fn round_trips_simple_fields() {
        let codec = IndexCodec::new();
        for kind in [
            TypeKind::String,
            TypeKind::Boolean,
            TypeKind::Int,
            TypeKind::Double,
            TypeKind::Float,
            TypeKind::Long,
            TypeKind::Bytes,
            TypeKind::Datetime,
            TypeKind::StringList,
            TypeKind::LongList,
            TypeKind::DatetimeList,
        ] {
            let field = Field::new("plainname", kind);
            assert_eq!(codec.decode(&codec.encode(&field)), field, "kind {kind}");
        }
    }
}
