//! quillkit CLI entry point
//!
//! Parses arguments, runs the selected command and prints failures with
//! context and suggestions:
//! - `render` - render a template to stdout
//! - `schema` - load a schema into the configured database
//! - `query` - run a read query and print JSON

use anyhow::Result;
use clap::Parser;
use quillkit::cli;
use quillkit::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
