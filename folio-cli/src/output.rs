use std::collections::BTreeMap;

use anyhow::Result;
use clap::ValueEnum;
use folio::{CommitAck, FieldValue, QueryResult, SchemaDefinition};
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// JSON output.
    Json,
}

/// Print search results.
pub fn print_search_results(results: &QueryResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json_results: Vec<serde_json::Value> = results
                .iter()
                .map(|doc| {
                    json!({
                        "score": doc.score(),
                        "document": doc.fields(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json_results)?);
        }
        OutputFormat::Table => {
            if results.is_empty() {
                println!("No results found.");
                return Ok(());
            }

            let rows: Vec<SearchResultRow> = results
                .iter()
                .enumerate()
                .map(|(i, doc)| SearchResultRow {
                    rank: i + 1,
                    score: format!("{:.4}", doc.score()),
                    fields: format_fields_compact(doc.fields()),
                })
                .collect();

            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
    }
    Ok(())
}

/// Print the schema of an index.
pub fn print_schema(schema: &SchemaDefinition, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
        OutputFormat::Table => {
            let rows: Vec<FieldRow> = schema
                .fields()
                .iter()
                .map(|field| FieldRow {
                    name: field.name().to_string(),
                    field_type: field.field_type().to_string(),
                    indexing: field
                        .indexing()
                        .map(|opts| match &opts.tokenizer {
                            Some(tokenizer) => format!("{} ({tokenizer})", opts.record.as_str()),
                            None => opts.record.as_str().to_string(),
                        })
                        .unwrap_or_else(|| "-".to_string()),
                    stored: field.is_stored(),
                })
                .collect();

            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{table}");
        }
    }
    Ok(())
}

/// Print the acknowledgement of a commit.
pub fn print_commit(ack: &CommitAck, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(ack)?);
        }
        OutputFormat::Table => {
            println!(
                "Committed {} document(s) at opstamp {}.",
                ack.documents(),
                ack.opstamp()
            );
        }
    }
    Ok(())
}

// --- Helper types and functions ---

#[derive(Tabled)]
struct SearchResultRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Type")]
    field_type: String,
    #[tabled(rename = "Indexing")]
    indexing: String,
    #[tabled(rename = "Stored")]
    stored: bool,
}

/// Convert stored fields to a compact display string.
fn format_fields_compact(fields: &BTreeMap<String, Vec<FieldValue>>) -> String {
    fields
        .iter()
        .map(|(name, values)| {
            let values: Vec<String> = values.iter().map(format_value).collect();
            format!("{name}: {}", values.join(" | "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a value for compact display.
fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) if s.chars().count() > 80 => {
            let head: String = s.chars().take(77).collect();
            format!("{head}...")
        }
        other => other.to_string(),
    }
}
