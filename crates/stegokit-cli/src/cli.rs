use clap::{Parser, Subcommand};

use crate::commands::{capacity, embed, extract};
use crate::CliResult;

#[derive(Parser, Debug)]
#[command(name = "stegokit", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Embed(embed::EmbedArgs),
    Extract(extract::ExtractArgs),
    Capacity(capacity::CapacityArgs),
}

impl CliArgs {
    pub fn run(self) -> CliResult<()> {
        match self.command {
            Commands::Embed(args) => args.run(),
            Commands::Extract(args) => args.run(),
            Commands::Capacity(args) => args.run(),
        }
    }
}
