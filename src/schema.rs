//! Schema definition for a Folio index.
//!
//! A [`SchemaDefinition`] is an ordered, validated list of [`FieldSpec`]s.
//! It is built once per index creation and never changes afterwards.
//!
//! # Module Structure
//!
//! - `field`: field declarations, raw and normalized
//! - `codec`: the canonical text form handed to the engine

pub mod codec;
pub mod field;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

pub use field::{
    FieldSpec, FieldType, IndexRecord, IndexingOptions, RawFieldOptions, RawFieldSpec,
    RawIndexingOptions,
};

/// Validated schema of an index.
///
/// Invariant: field names are unique and non-empty, and every field's indexing
/// options fit its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RawFieldSpec>", into = "Vec<RawFieldSpec>")]
pub struct SchemaDefinition {
    fields: Vec<FieldSpec>,
}

impl SchemaDefinition {
    /// Validate and normalize raw field records.
    ///
    /// Fails with [`FolioError::Schema`] when the list is empty, a name is empty
    /// or duplicated, a type or record mode is unrecognized, or indexing options
    /// do not fit the declared type.
    pub fn validate(raw_fields: impl IntoIterator<Item = RawFieldSpec>) -> Result<Self> {
        let mut fields = Vec::new();
        let mut seen = HashSet::new();

        for raw in raw_fields {
            let spec = FieldSpec::from_raw(&raw)?;
            if !seen.insert(spec.name().to_string()) {
                return Err(FolioError::schema(format!(
                    "duplicate field name '{}'",
                    spec.name()
                )));
            }
            fields.push(spec);
        }

        if fields.is_empty() {
            return Err(FolioError::schema("schema must declare at least one field"));
        }

        Ok(Self { fields })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names of fields whose values come back in query results.
    pub fn stored_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.is_stored())
            .map(|f| f.name())
    }

    /// Names of searchable text fields, used as default query fields.
    pub fn indexed_text_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.field_type() == FieldType::Text && f.is_indexed())
            .map(|f| f.name())
    }

    /// Raw (wire) records of all fields.
    pub fn to_raw(&self) -> Vec<RawFieldSpec> {
        self.fields.iter().map(FieldSpec::to_raw).collect()
    }
}

impl TryFrom<Vec<RawFieldSpec>> for SchemaDefinition {
    type Error = FolioError;

    fn try_from(raw: Vec<RawFieldSpec>) -> Result<Self> {
        Self::validate(raw)
    }
}

impl From<SchemaDefinition> for Vec<RawFieldSpec> {
    fn from(schema: SchemaDefinition) -> Self {
        schema.to_raw()
    }
}

/// Builder for [`SchemaDefinition`].
///
/// Validation is deferred to [`SchemaBuilder::build`], so a builder with a
/// duplicate name fails there rather than on `add_*`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<RawFieldSpec>,
}

impl SchemaBuilder {
    /// Add a field from typed parts.
    pub fn add_field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec.to_raw());
        self
    }

    /// Add a text field. `tokenizer` of `None` declares a stored-only field.
    pub fn add_text_field(
        self,
        name: impl Into<String>,
        tokenizer: Option<&str>,
        stored: bool,
    ) -> Self {
        let indexing = tokenizer.map(IndexingOptions::text);
        self.add_field(FieldSpec::new(name, FieldType::Text, indexing, stored))
    }

    /// Add a numeric field.
    pub fn add_numeric_field(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        indexed: bool,
        stored: bool,
    ) -> Self {
        let indexing = indexed.then(IndexingOptions::numeric);
        self.add_field(FieldSpec::new(name, field_type, indexing, stored))
    }

    /// Add a raw field record.
    pub fn add_raw(mut self, raw: RawFieldSpec) -> Self {
        self.fields.push(raw);
        self
    }

    pub fn build(self) -> Result<SchemaDefinition> {
        SchemaDefinition::validate(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchemaDefinition {
        SchemaDefinition::builder()
            .add_text_field("title", Some("en_stem"), true)
            .add_text_field("body", Some("en_stem"), false)
            .add_text_field("url", None, true)
            .add_numeric_field("year", FieldType::U64, true, true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = SchemaDefinition::builder()
            .add_text_field("title", Some("default"), true)
            .add_text_field("title", None, true)
            .build()
            .unwrap_err();
        assert!(matches!(err, FolioError::Schema(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(
            SchemaDefinition::validate(Vec::new()),
            Err(FolioError::Schema(_))
        ));
    }

    #[test]
    fn test_field_views() {
        let schema = sample();
        assert_eq!(schema.len(), 4);
        assert!(schema.contains("url"));
        assert!(!schema.contains("missing"));
        assert_eq!(
            schema.stored_fields().collect::<Vec<_>>(),
            vec!["title", "url", "year"]
        );
        assert_eq!(
            schema.indexed_text_fields().collect::<Vec<_>>(),
            vec!["title", "body"]
        );
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"[
            {"name": "a", "type": "text", "options": {"indexing": null, "stored": true}},
            {"name": "a", "type": "text", "options": {"indexing": null, "stored": true}}
        ]"#;
        assert!(serde_json::from_str::<SchemaDefinition>(json).is_err());

        let schema = sample();
        let json = serde_json::to_string(&schema).unwrap();
        let back: SchemaDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}
