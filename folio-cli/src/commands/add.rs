use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use folio::Document;
use serde::Deserialize;

use crate::context;
use crate::output::{self, OutputFormat};

/// A document file holds either one object or an array of objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentInput {
    Many(Vec<Document>),
    One(Document),
}

impl DocumentInput {
    fn into_documents(self) -> Vec<Document> {
        match self {
            DocumentInput::Many(docs) => docs,
            DocumentInput::One(doc) => vec![doc],
        }
    }
}

/// Stage the given documents in one writer session and commit them.
///
/// A document that fails validation aborts the command before the commit, so
/// nothing from this invocation becomes visible.
pub fn run(
    data: Option<String>,
    file: Option<PathBuf>,
    data_dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    let text = match (data, file) {
        (Some(data), _) => data,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        (None, None) => anyhow::bail!("Either --data or --file is required"),
    };
    let input: DocumentInput =
        serde_json::from_str(&text).context("Failed to parse document JSON")?;
    let documents = input.into_documents();

    let index = context::open_index(data_dir)?;
    let mut writer = index.writer()?;
    for (i, doc) in documents.into_iter().enumerate() {
        writer
            .add_document(doc)
            .with_context(|| format!("Document #{} was rejected", i + 1))?;
    }
    let ack = writer.commit().context("Failed to commit documents")?;

    output::print_commit(&ack, format)
}
