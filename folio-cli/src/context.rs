use std::path::Path;

use anyhow::{Context, Result, bail};
use folio::{IndexHandle, SchemaDefinition};

/// Create a new index in the given data directory from a schema JSON file.
///
/// Accepts both the versioned envelope and a bare array of field records.
pub fn create_index(data_dir: &Path, schema_path: &Path) -> Result<IndexHandle> {
    let schema_content =
        std::fs::read_to_string(schema_path).context("Failed to read schema file")?;
    let schema = folio::schema::codec::parse(&schema_content)
        .context("Failed to parse schema JSON")?;

    std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    let index = IndexHandle::create_in_dir(data_dir, &schema)
        .with_context(|| format!("Failed to create index at {}", data_dir.display()))?;
    Ok(index)
}

/// Open an existing index from the given data directory.
pub fn open_index(data_dir: &Path) -> Result<IndexHandle> {
    if !data_dir.is_dir() {
        bail!(
            "No index found at {}. Run 'create index' first.",
            data_dir.display()
        );
    }

    let index = IndexHandle::open_in_dir(data_dir)
        .with_context(|| format!("Failed to open index at {}", data_dir.display()))?;
    Ok(index)
}

/// Schema of the index at `data_dir`.
pub fn read_schema(data_dir: &Path) -> Result<SchemaDefinition> {
    Ok(open_index(data_dir)?.schema().clone())
}
