mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::cli::{AddResource, Cli, Command, CreateResource, GetResource};
use crate::commands::{add, search};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format;
    let data_dir = cli.data_dir;

    match cli.command {
        Command::Create(cmd) => match cmd.resource {
            CreateResource::Index { schema } => {
                context::create_index(&data_dir, &schema)?;
                println!("Index created at {}.", data_dir.display());
                Ok(())
            }
        },
        Command::Get(cmd) => match cmd.resource {
            GetResource::Schema => {
                let schema = context::read_schema(&data_dir)?;
                output::print_schema(&schema, format)
            }
        },
        Command::Add(cmd) => match cmd.resource {
            AddResource::Doc { data, file } => add::run(data, file, &data_dir, format),
        },
        Command::Search(cmd) => search::run(cmd, &data_dir, format),
    }
}
