use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod runtime_utils;

fn main() -> Result<()> {
    let parsed = cli::Cli::parse();

    // The fixture is torn down inside dispatch, so exiting here skips nothing
    let code = parsed.dispatch()?;
    std::process::exit(code);
}
