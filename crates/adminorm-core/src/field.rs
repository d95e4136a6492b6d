//! Field descriptors and their naming metadata.
//!
//! Every model field carries an optional tag string of `;`-separated
//! segments, each either `key` or `key:value`:
//!
//! ```text
//! column:user_email;primaryKey;size:255
//! ```
//!
//! Keys are case-insensitive. `column` overrides the database column name,
//! `primaryKey` (or `primary_key`) marks a primary key candidate, and every
//! other key is preserved as an opaque setting.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::SqlType;

/// Metadata about a model field, as emitted by `#[derive(Model)]`.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Rust field name; the logical name callers use in projections
    pub name: &'static str,
    /// Raw naming metadata, e.g. `"column:user_email;primaryKey"`
    pub tag: Option<&'static str>,
    /// SQL type for this field
    pub sql_type: SqlType,
    /// Whether this field is nullable
    pub nullable: bool,
}

impl FieldInfo {
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            tag: None,
            sql_type,
            nullable: false,
        }
    }

    /// Attach naming metadata.
    pub const fn tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub const fn tag_opt(mut self, tag: Option<&'static str>) -> Self {
        self.tag = tag;
        self
    }

    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Parse this field's naming metadata.
    pub fn parse_tag(&self) -> Result<FieldTag, String> {
        match self.tag {
            Some(raw) => FieldTag::parse(raw),
            None => Ok(FieldTag::default()),
        }
    }
}

/// Parsed naming metadata of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    column: Option<String>,
    primary_key: bool,
    settings: Vec<(String, Option<String>)>,
}

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

/// Check that a column override is a plain SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_pattern().is_some_and(|re| re.is_match(name))
}

impl FieldTag {
    /// Parse a raw tag string.
    ///
    /// Fails on an empty or non-identifier `column` value and on a
    /// `primaryKey` value other than `true`/`false`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut tag = FieldTag::default();

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = match segment.split_once(':') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (segment, None),
            };

            if key.eq_ignore_ascii_case("column") {
                let column = value.unwrap_or_default();
                if column.is_empty() {
                    return Err("column override has no value".to_string());
                }
                if !is_valid_identifier(column) {
                    return Err(format!("column override '{}' is not an identifier", column));
                }
                tag.column = Some(column.to_string());
            } else if key.eq_ignore_ascii_case("primarykey")
                || key.eq_ignore_ascii_case("primary_key")
            {
                tag.primary_key = match value {
                    None => true,
                    Some(v) if v.eq_ignore_ascii_case("true") => true,
                    Some(v) if v.eq_ignore_ascii_case("false") => false,
                    Some(v) => return Err(format!("invalid primary key flag '{}'", v)),
                };
            } else {
                tag.settings
                    .push((key.to_string(), value.map(str::to_string)));
            }
        }

        Ok(tag)
    }

    /// Explicit column override, if present.
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Look up an opaque setting by key (case-insensitive).
    ///
    /// Returns `Some(None)` for a bare key and `Some(Some(v))` for `key:v`.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.settings
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_deref())
    }
}
