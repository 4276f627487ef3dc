//! KantanPress CLI — publish CMS content as a static site.
//!
//! Fetches collections from a Kantan CMS project, converts them into
//! generator-ready content files, builds the site, and uploads the result.

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
