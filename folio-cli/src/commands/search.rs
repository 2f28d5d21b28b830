use std::path::Path;

use anyhow::{Context, Result};
use folio::QueryExecutor;

use crate::cli::SearchCommand;
use crate::context;
use crate::output::{self, OutputFormat};

/// Execute a search command.
pub fn run(cmd: SearchCommand, data_dir: &Path, format: OutputFormat) -> Result<()> {
    let index = context::open_index(data_dir)?;

    let mut executor = QueryExecutor::new(&index);
    if let Some(limit) = cmd.limit {
        executor = executor.limit(limit);
    }

    let results = executor
        .query(&cmd.query)
        .with_context(|| format!("Search for '{}' failed", cmd.query))?;
    output::print_search_results(&results, format)
}
