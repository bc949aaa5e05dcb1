//! nbsteps CLI: export an executed notebook as a steps document.
//!
//! Produces the versioned steps document, metrics manifest, and figure files
//! that the static site renders.

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
