use clap::Parser;
use miette::Result;

use metro_dec_rs::cli;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = cli::Args::parse();
    cli::run(args)?;
    Ok(())
}
