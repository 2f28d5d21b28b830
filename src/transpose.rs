//! Conversion of documents into engine field/value pairs.
//!
//! The engine takes a flat, ordered list of `(field, value)` pairs. The
//! [`DocumentTransposer`] produces that list from a [`Document`], checking every
//! key against the schema and every value against its field type on the way.

use crate::data::{Document, FieldValue};
use crate::error::{FolioError, Result};
use crate::schema::{FieldType, SchemaDefinition};

/// Ordered field/value pairs as handed to the engine.
pub type FieldPairs = Vec<(String, FieldValue)>;

/// Validates documents against a schema and flattens them into [`FieldPairs`].
#[derive(Debug, Clone, Copy)]
pub struct DocumentTransposer<'a> {
    schema: &'a SchemaDefinition,
}

impl<'a> DocumentTransposer<'a> {
    pub fn new(schema: &'a SchemaDefinition) -> Self {
        Self { schema }
    }

    /// Flatten `doc` into ordered pairs.
    ///
    /// Pairs follow the document's key order, and values within a key keep
    /// their order. Integers are widened or narrowed to the field's numeric
    /// type when they fit.
    ///
    /// Fails with [`FolioError::Validation`] if a key is not declared in the
    /// schema or a value does not fit its field type. Nothing is produced for a
    /// document that fails.
    pub fn transpose(&self, doc: &Document) -> Result<FieldPairs> {
        let mut pairs = Vec::with_capacity(doc.len());

        for (name, values) in doc.iter() {
            let spec = self.schema.field(name).ok_or_else(|| {
                FolioError::validation(format!("field '{name}' is not declared in the schema"))
            })?;

            for value in values {
                let value = coerce(spec.field_type(), value).ok_or_else(|| {
                    FolioError::validation(format!(
                        "field '{name}' expects {} values, got {} value '{value}'",
                        spec.field_type(),
                        value.kind()
                    ))
                })?;
                pairs.push((name.to_string(), value));
            }
        }

        Ok(pairs)
    }
}

fn coerce(field_type: FieldType, value: &FieldValue) -> Option<FieldValue> {
    match field_type {
        FieldType::Text => value.as_text().map(|s| FieldValue::Text(s.to_string())),
        FieldType::U64 => value.as_u64().map(FieldValue::U64),
        FieldType::I64 => value.as_i64().map(FieldValue::I64),
        FieldType::F64 => value.as_f64().map(FieldValue::F64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaDefinition {
        SchemaDefinition::builder()
            .add_text_field("title", Some("en_stem"), true)
            .add_text_field("url", None, true)
            .add_numeric_field("year", FieldType::U64, true, true)
            .add_numeric_field("rating", FieldType::F64, false, true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_pairs_follow_document_order() {
        let schema = schema();
        let doc = Document::new()
            .add_text("url", "a:1")
            .add_text("title", "Hello")
            .add_text("title", "World");

        let pairs = DocumentTransposer::new(&schema).transpose(&doc).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("url".to_string(), FieldValue::from("a:1")),
                ("title".to_string(), FieldValue::from("Hello")),
                ("title".to_string(), FieldValue::from("World")),
            ]
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = schema();
        let doc = Document::new()
            .add_text("title", "Hello")
            .add_text("unknownField", "x");

        let err = DocumentTransposer::new(&schema).transpose(&doc).unwrap_err();
        assert!(matches!(err, FolioError::Validation(msg) if msg.contains("unknownField")));
    }

    #[test]
    fn test_numeric_coercion() {
        let schema = schema();
        let transposer = DocumentTransposer::new(&schema);

        let doc = Document::new()
            .add_field("year", 2024i64)
            .add_field("rating", 4u64);
        let pairs = transposer.transpose(&doc).unwrap();
        assert_eq!(pairs[0].1, FieldValue::U64(2024));
        assert_eq!(pairs[1].1, FieldValue::F64(4.0));

        let doc = Document::new().add_field("year", -1i64);
        assert!(matches!(
            transposer.transpose(&doc),
            Err(FolioError::Validation(_))
        ));

        let doc = Document::new().add_field("title", 7u64);
        assert!(matches!(
            transposer.transpose(&doc),
            Err(FolioError::Validation(_))
        ));
    }
}
