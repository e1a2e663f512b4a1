// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Dynamic-field name patterns.
//!
//! Backends declare dynamic fields as `*suffix`, `prefix*`, an exact
//! name, or (rarely) a richer wildcard expression. The common forms get
//! dedicated matchers; only the rich form pays for a compiled regex.

use regex::Regex;

/// A parsed dynamic-field pattern.
#[derive(Debug, Clone)]
pub struct SchemaPattern {
    spec: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Matches(Regex),
}

impl SchemaPattern {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let matcher = if !spec.contains(['*', '?']) {
            Matcher::Equals(spec.to_string())
        } else if let Some(suffix) = spec.strip_prefix('*') {
            if suffix.contains(['*', '?']) {
                Matcher::Matches(compile(spec)?)
            } else {
                Matcher::EndsWith(suffix.to_string())
            }
        } else if let Some(prefix) = spec.strip_suffix('*') {
            if prefix.contains(['*', '?']) {
                Matcher::Matches(compile(spec)?)
            } else {
                Matcher::StartsWith(prefix.to_string())
            }
        } else {
            Matcher::Matches(compile(spec)?)
        };
        Ok(SchemaPattern {
            spec: spec.to_string(),
            matcher,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::Equals(exact) => name == exact,
            Matcher::StartsWith(prefix) => name.starts_with(prefix),
            Matcher::EndsWith(suffix) => name.ends_with(suffix),
            Matcher::Matches(re) => re.is_match(name),
        }
    }

    /// Length of the literal part, used to order patterns most-specific
    /// first (`*_dts` beats `*_s`; an exact name beats both).
    pub fn literal_len(&self) -> usize {
        self.spec.chars().filter(|c| *c != '*' && *c != '?').count()
    }

    /// Exact names outrank any wildcard of the same literal length.
    pub fn is_exact(&self) -> bool {
        matches!(self.matcher, Matcher::Equals(_))
    }

    pub fn spec(&self) -> &str {
        &self.spec
    }
}

fn compile(spec: &str) -> Result<Regex, String> {
    let mut pattern = String::from("^");
    for ch in spec.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| e.to_string())
}
