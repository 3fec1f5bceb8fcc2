//! The `query` command.
//!
//! Parameter values are parsed as JSON when they are valid JSON (`1`,
//! `true`, `null`, `"quoted"`) and passed as strings otherwise.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value;

use crate::config::Settings;
use crate::db::{Db, FetchMethod, Params};

#[derive(Args, Debug)]
pub struct QueryCommand {
    /// SQL with `?`, `%s`/`%d`/`%F` or `:name` placeholders
    #[arg(value_name = "SQL")]
    sql: String,

    /// Positional parameter (repeatable)
    #[arg(short, long = "param", value_name = "VALUE")]
    params: Vec<String>,

    /// Named parameter as NAME=VALUE (repeatable)
    #[arg(short, long = "named", value_name = "NAME=VALUE")]
    named: Vec<String>,

    /// Read fetcher to run
    #[arg(short, long, default_value = "get_results")]
    method: String,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,
}

impl QueryCommand {
    pub fn execute(self, settings: &Settings) -> Result<()> {
        let method: FetchMethod = self.method.parse()?;
        let params = self.build_params()?;

        let mut db = Db::from_options(&settings.database).context("Failed to open database")?;
        let fetched = db.fetch(method, self.sql.as_str(), params)?;
        tracing::debug!("{} returned {} row(s)", method, db.stats().num_rows);

        let value = fetched.into_value();
        let output = if self.compact {
            serde_json::to_string(&value)?
        } else {
            serde_json::to_string_pretty(&value)?
        };
        println!("{}", output);
        Ok(())
    }

    fn build_params(&self) -> Result<Params> {
        let mut params = Params::new();
        for raw in &self.params {
            params.push(parse_value(raw));
        }
        for pair in &self.named {
            let (name, raw) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Named parameter '{}' must have the form NAME=VALUE", pair))?;
            params.set(name.trim_start_matches(':'), parse_value(raw));
        }
        Ok(params)
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
