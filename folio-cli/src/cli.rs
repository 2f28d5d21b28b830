use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Folio - document index CLI
#[derive(Parser)]
#[command(name = "folio", version, about)]
pub struct Cli {
    /// Path to the index directory.
    #[arg(long, env = "FOLIO_DATA_DIR", default_value = "./folio_data")]
    pub data_dir: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a resource.
    Create(CreateCommand),
    /// Get a resource.
    Get(GetCommand),
    /// Add documents and commit them.
    Add(AddCommand),
    /// Execute a search query.
    Search(SearchCommand),
}

// --- Create ---

#[derive(Parser)]
pub struct CreateCommand {
    #[command(subcommand)]
    pub resource: CreateResource,
}

#[derive(Subcommand)]
pub enum CreateResource {
    /// Create a new index from a schema JSON file.
    Index {
        /// Path to the schema JSON file.
        #[arg(long)]
        schema: PathBuf,
    },
}

// --- Get ---

#[derive(Parser)]
pub struct GetCommand {
    #[command(subcommand)]
    pub resource: GetResource,
}

#[derive(Subcommand)]
pub enum GetResource {
    /// Show the schema of the index.
    Schema,
}

// --- Add ---

#[derive(Parser)]
pub struct AddCommand {
    #[command(subcommand)]
    pub resource: AddResource,
}

#[derive(Subcommand)]
pub enum AddResource {
    /// Add one document, or every document of a JSON array file.
    Doc {
        /// Document data as a JSON object.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        data: Option<String>,
        /// Path to a JSON file holding an object or an array of objects.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

// --- Search ---

#[derive(Parser)]
pub struct SearchCommand {
    /// Query text, in the engine's query syntax.
    pub query: String,

    /// Maximum number of results.
    #[arg(long)]
    pub limit: Option<usize>,
}
