// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bidirectional field-name codecs.
//!
//! A codec turns a [`Field`] into an external name and back. Three
//! strategies ship with the crate:
//!
//! - [`PlainCodec`]: the external name is the field name itself; kinds are
//!   remembered in a bidirectional cache and inferred from sample values.
//! - [`SuffixCodec`]: the kind travels inside the name as a `_suffix`
//!   token (`title_s`, `count_l`), so names are self-describing.
//! - [`IndexCodec`]: the backend-specialized form — characters the index
//!   cannot digest are escaped, kinds map to the backend's dynamic-field
//!   suffixes, and reserved system fields pass through untouched.

mod index;
mod mapping;
mod plain;
mod suffix;

pub use index::IndexCodec;
pub use mapping::{FieldMapping, FieldMappingSet};
pub use plain::PlainCodec;
pub use suffix::SuffixCodec;

use serde_json::Value;

use crate::field::Field;

/// A bidirectional field-name codec.
pub trait FieldCodec: Send + Sync {
    /// Render a field as an external name.
    fn encode(&self, field: &Field) -> String;

    /// Resolve an external name back to a field. Total: unknown names
    /// decode to the codec's default kind rather than failing.
    fn decode(&self, name: &str) -> Field;

    /// Like [`decode`](Self::decode), with a sample value available for
    /// kind inference. The default implementation ignores the sample.
    fn decode_with_value(&self, name: &str, sample: &Value) -> Field {
        let _ = sample;
        self.decode(name)
    }
}
