//! The `schema` command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Settings;
use crate::db::Db;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Schema file, or literal SQL when the argument contains whitespace
    #[arg(value_name = "SOURCE")]
    source: String,
}

impl SchemaCommand {
    pub fn execute(self, settings: &Settings) -> Result<()> {
        let mut db = Db::from_options(&settings.database).context("Failed to open database")?;
        let count = db.load_schema(&self.source)?;
        println!("{} Applied {} statement(s)", "✓".green(), count);
        Ok(())
    }
}
