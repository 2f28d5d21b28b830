//! Canonical text form of a schema.
//!
//! The engine receives the schema as text at index creation and hands the same
//! text back when an index is opened. The format is a versioned JSON envelope:
//!
//! ```json
//! {"version":1,"fields":[{"name":"title","type":"text","options":{"indexing":{"record":"position","tokenizer":"en_stem"},"stored":true}}]}
//! ```
//!
//! [`parse`] also accepts a bare field array, the layout older bindings
//! produced, and reads it as version 1.

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};
use crate::schema::{RawFieldSpec, SchemaDefinition};

/// Current version of the schema text format.
pub const SCHEMA_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    fields: &'a [RawFieldSpec],
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    fields: Vec<RawFieldSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaText {
    Envelope(Envelope),
    Legacy(Vec<RawFieldSpec>),
}

/// Produce the canonical text of a schema.
pub fn serialize(schema: &SchemaDefinition) -> Result<String> {
    let fields = schema.to_raw();
    let envelope = EnvelopeRef {
        version: SCHEMA_FORMAT_VERSION,
        fields: &fields,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse and validate schema text produced by [`serialize`].
pub fn parse(text: &str) -> Result<SchemaDefinition> {
    let parsed: SchemaText = serde_json::from_str(text)
        .map_err(|e| FolioError::schema(format!("malformed schema text: {e}")))?;

    let fields = match parsed {
        SchemaText::Envelope(envelope) => {
            if envelope.version != SCHEMA_FORMAT_VERSION {
                return Err(FolioError::schema(format!(
                    "unsupported schema format version {} (expected {})",
                    envelope.version, SCHEMA_FORMAT_VERSION
                )));
            }
            envelope.fields
        }
        SchemaText::Legacy(fields) => fields,
    };

    SchemaDefinition::validate(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn sample() -> SchemaDefinition {
        SchemaDefinition::builder()
            .add_text_field("title", Some("en_stem"), true)
            .add_text_field("url", None, true)
            .add_numeric_field("year", FieldType::I64, true, false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_canonical_text() {
        let text = serialize(&sample()).unwrap();
        assert_eq!(
            text,
            concat!(
                r#"{"version":1,"fields":["#,
                r#"{"name":"title","type":"text","options":{"indexing":{"record":"position","tokenizer":"en_stem"},"stored":true}},"#,
                r#"{"name":"url","type":"text","options":{"indexing":null,"stored":true}},"#,
                r#"{"name":"year","type":"i64","options":{"indexing":{"record":"basic"},"stored":false}}"#,
                r#"]}"#
            )
        );
    }

    #[test]
    fn test_parse_inverts_serialize() {
        let schema = sample();
        assert_eq!(parse(&serialize(&schema).unwrap()).unwrap(), schema);
    }

    #[test]
    fn test_parse_legacy_array() {
        let text = r#"[
            {"name": "title", "type": "text",
             "options": {"indexing": {"record": "position", "tokenizer": "en_stem"}, "stored": true}},
            {"name": "url", "type": "text", "options": {"indexing": null, "stored": true}}
        ]"#;
        let schema = parse(text).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.field("title").unwrap().is_indexed());
        assert!(!schema.field("url").unwrap().is_indexed());
    }

    #[test]
    fn test_parse_rejects_unknown_version_and_garbage() {
        let text = r#"{"version": 7, "fields": []}"#;
        assert!(matches!(parse(text), Err(FolioError::Schema(msg)) if msg.contains("version")));

        assert!(matches!(parse("not json"), Err(FolioError::Schema(_))));
    }
}
