//! Field declarations.
//!
//! This module defines:
//! - [`RawFieldSpec`] - A field record as a caller writes it (strings, optional parts)
//! - [`FieldSpec`] - The normalized, validated form of a field
//! - [`FieldType`], [`IndexingOptions`], [`IndexRecord`] - Typed field options
//!
//! Raw records mirror the wire format:
//!
//! ```json
//! {
//!   "name": "title",
//!   "type": "text",
//!   "options": {
//!     "indexing": { "record": "position", "tokenizer": "en_stem" },
//!     "stored": true
//!   }
//! }
//! ```
//!
//! `indexing: null` declares a field that is not searchable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Tokenized full-text content.
    Text,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// 64-bit floating point number.
    F64,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::U64 => "u64",
            FieldType::I64 => "i64",
            FieldType::F64 => "f64",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, FieldType::Text)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "str" => Ok(FieldType::Text),
            "u64" => Ok(FieldType::U64),
            "i64" => Ok(FieldType::I64),
            "f64" => Ok(FieldType::F64),
            other => Err(FolioError::schema(format!("unrecognized field type '{other}'"))),
        }
    }
}

/// What the engine records per indexed term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexRecord {
    /// Document ids only.
    #[default]
    Basic,
    /// Document ids and term frequencies.
    Freq,
    /// Document ids, term frequencies and positions (required for phrase queries).
    Position,
}

impl IndexRecord {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexRecord::Basic => "basic",
            IndexRecord::Freq => "freq",
            IndexRecord::Position => "position",
        }
    }
}

impl FromStr for IndexRecord {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(IndexRecord::Basic),
            "freq" => Ok(IndexRecord::Freq),
            "position" => Ok(IndexRecord::Position),
            other => Err(FolioError::schema(format!("unrecognized record mode '{other}'"))),
        }
    }
}

/// Indexing options of a searchable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingOptions {
    /// Positional recording mode.
    pub record: IndexRecord,
    /// Tokenizer name, opaque to Folio. Required for text fields, absent otherwise.
    pub tokenizer: Option<String>,
}

impl IndexingOptions {
    /// Text indexing with the given tokenizer, recording positions.
    pub fn text(tokenizer: impl Into<String>) -> Self {
        Self {
            record: IndexRecord::Position,
            tokenizer: Some(tokenizer.into()),
        }
    }

    /// Numeric indexing.
    pub fn numeric() -> Self {
        Self {
            record: IndexRecord::Basic,
            tokenizer: None,
        }
    }

    pub fn with_record(mut self, record: IndexRecord) -> Self {
        self.record = record;
        self
    }
}

/// A validated field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    field_type: FieldType,
    indexing: Option<IndexingOptions>,
    stored: bool,
}

impl FieldSpec {
    /// Validate and normalize a raw field record.
    pub fn from_raw(raw: &RawFieldSpec) -> Result<Self> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(FolioError::schema("field name must not be empty"));
        }

        let field_type: FieldType = raw
            .field_type
            .parse()
            .map_err(|e| FolioError::schema(format!("field '{name}': {}", schema_message(e))))?;

        let indexing = match &raw.options.indexing {
            None => None,
            Some(opts) => Some(Self::normalize_indexing(name, field_type, opts)?),
        };

        Ok(Self {
            name: name.to_string(),
            field_type,
            indexing,
            stored: raw.options.stored,
        })
    }

    fn normalize_indexing(
        name: &str,
        field_type: FieldType,
        raw: &RawIndexingOptions,
    ) -> Result<IndexingOptions> {
        let record = match &raw.record {
            Some(record) => record
                .parse()
                .map_err(|e| FolioError::schema(format!("field '{name}': {}", schema_message(e))))?,
            None if field_type.is_numeric() => IndexRecord::Basic,
            None => IndexRecord::Position,
        };

        let tokenizer = raw
            .tokenizer
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        match field_type {
            FieldType::Text => {
                if tokenizer.is_none() {
                    return Err(FolioError::schema(format!(
                        "field '{name}': text indexing requires a tokenizer"
                    )));
                }
            }
            _ => {
                if tokenizer.is_some() {
                    return Err(FolioError::schema(format!(
                        "field '{name}': {field_type} fields do not take a tokenizer"
                    )));
                }
                if record != IndexRecord::Basic {
                    return Err(FolioError::schema(format!(
                        "field '{name}': {field_type} fields only support the 'basic' record mode"
                    )));
                }
            }
        }

        Ok(IndexingOptions { record, tokenizer })
    }

    /// Create a field spec from already typed parts.
    ///
    /// The result still has to pass [`SchemaDefinition`](super::SchemaDefinition)
    /// validation, which re-checks it through its raw form.
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        indexing: Option<IndexingOptions>,
        stored: bool,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            indexing,
            stored,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn indexing(&self) -> Option<&IndexingOptions> {
        self.indexing.as_ref()
    }

    pub fn is_indexed(&self) -> bool {
        self.indexing.is_some()
    }

    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Convert back to the raw (wire) form.
    pub fn to_raw(&self) -> RawFieldSpec {
        RawFieldSpec {
            name: self.name.clone(),
            field_type: self.field_type.as_str().to_string(),
            options: RawFieldOptions {
                indexing: self.indexing.as_ref().map(|opts| RawIndexingOptions {
                    record: Some(opts.record.as_str().to_string()),
                    tokenizer: opts.tokenizer.clone(),
                }),
                stored: self.stored,
            },
        }
    }
}

fn schema_message(err: FolioError) -> String {
    match err {
        FolioError::Schema(msg) => msg,
        other => other.to_string(),
    }
}

/// A field record as supplied by a caller or read from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub options: RawFieldOptions,
}

impl RawFieldSpec {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            options: RawFieldOptions::default(),
        }
    }

    pub fn indexing(mut self, record: Option<&str>, tokenizer: Option<&str>) -> Self {
        self.options.indexing = Some(RawIndexingOptions {
            record: record.map(str::to_string),
            tokenizer: tokenizer.map(str::to_string),
        });
        self
    }

    pub fn stored(mut self) -> Self {
        self.options.stored = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFieldOptions {
    /// `None` (JSON `null`) means the field is not searchable.
    #[serde(default)]
    pub indexing: Option<RawIndexingOptions>,
    #[serde(default)]
    pub stored: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIndexingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_field_normalization() {
        let raw = RawFieldSpec::new(" title ", "TEXT")
            .indexing(Some("Position"), Some("en_stem"))
            .stored();
        let spec = FieldSpec::from_raw(&raw).unwrap();

        assert_eq!(spec.name(), "title");
        assert_eq!(spec.field_type(), FieldType::Text);
        assert_eq!(spec.indexing(), Some(&IndexingOptions::text("en_stem")));
        assert!(spec.is_stored());
    }

    #[test]
    fn test_text_indexing_requires_tokenizer() {
        let raw = RawFieldSpec::new("body", "text").indexing(Some("position"), None);
        let err = FieldSpec::from_raw(&raw).unwrap_err();
        assert!(matches!(err, FolioError::Schema(msg) if msg.contains("tokenizer")));
    }

    #[test]
    fn test_numeric_rejects_tokenizer_and_positions() {
        let raw = RawFieldSpec::new("year", "u64").indexing(None, Some("default"));
        assert!(matches!(FieldSpec::from_raw(&raw), Err(FolioError::Schema(_))));

        let raw = RawFieldSpec::new("year", "u64").indexing(Some("position"), None);
        assert!(matches!(FieldSpec::from_raw(&raw), Err(FolioError::Schema(_))));

        let raw = RawFieldSpec::new("year", "u64").indexing(None, None);
        let spec = FieldSpec::from_raw(&raw).unwrap();
        assert_eq!(spec.indexing(), Some(&IndexingOptions::numeric()));
    }

    #[test]
    fn test_unknown_type_and_record() {
        let raw = RawFieldSpec::new("x", "blob");
        assert!(matches!(FieldSpec::from_raw(&raw), Err(FolioError::Schema(_))));

        let raw = RawFieldSpec::new("x", "text").indexing(Some("offsets"), Some("default"));
        assert!(matches!(FieldSpec::from_raw(&raw), Err(FolioError::Schema(_))));
    }

    #[test]
    fn test_not_indexed_field() {
        let raw: RawFieldSpec = serde_json::from_str(
            r#"{"name": "url", "type": "text", "options": {"indexing": null, "stored": true}}"#,
        )
        .unwrap();
        let spec = FieldSpec::from_raw(&raw).unwrap();
        assert!(!spec.is_indexed());
        assert!(spec.is_stored());
        assert_eq!(spec.to_raw(), raw);
    }
}
