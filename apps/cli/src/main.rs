//! Sous-chef CLI: a conversational cooking assistant.
//!
//! Reads a recipe from the web (or a JSON file), extracts what each line is
//! about, and walks the user through the steps one command at a time.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
