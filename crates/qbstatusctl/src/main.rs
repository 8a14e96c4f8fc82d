//! qbstatusctl - QuickBooks sync status CLI
//!
//! Reads a snapshot of Web Connector state and prints connection health
//! or queue/mirror error reports.

use anyhow::Result;
use clap::Parser;
use qbstatusctl::cli::Cli;
use qbstatusctl::{commands, logging};
use std::io::Write;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let output = commands::execute(&cli)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
