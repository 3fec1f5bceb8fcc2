//! Command-line interface for quillkit.
//!
//! # Commands
//!
//! - `render` - render a template (optionally as a full page) to stdout
//! - `schema` - load a schema into the configured database
//! - `query` - run a read fetcher and print the result as JSON
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging
//! - `--quiet` / `-q` - errors only
//! - `--config` / `-c` - settings file (also `QUILLKIT_CONFIG`; defaults to
//!   `quillkit.toml` in the current directory when present)
//!
//! `RUST_LOG` overrides the level chosen by `--verbose` and `--quiet`.
//!
//! # Examples
//!
//! ```bash
//! quillkit --config site/quillkit.toml render home --primary
//! quillkit schema schema.sql
//! quillkit query "SELECT name FROM users WHERE id = %d" --param 1 --method get_var
//! ```

mod query;
mod render;
mod schema;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::config::{Settings, load_settings};

pub use query::QueryCommand;
pub use render::RenderCommand;
pub use schema::SchemaCommand;

/// Settings file looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "quillkit.toml";

/// Runtime options derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` logs errors only.
    pub log_level: Option<String>,

    /// Explicit settings file.
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// A subscriber that is already installed (for example by a test
    /// harness) is left in place.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("error"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the settings file, or defaults rooted at the current directory.
    pub fn load_settings(&self) -> Result<Settings> {
        if let Some(path) = &self.config_path {
            return load_settings(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            return load_settings(fallback);
        }

        tracing::debug!("No {} found; using default settings", DEFAULT_CONFIG_FILE);
        Ok(Settings {
            search_paths: vec![PathBuf::from(".")],
            ..Settings::default()
        })
    }
}

#[derive(Parser)]
#[command(
    name = "quillkit",
    about = "Render templates and query SQLite databases",
    version,
    author,
    long_about = "quillkit pairs a cached SQL access layer with a template view layer: \
                  themes, function templates, asset queues and page data injection."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the settings file
    #[arg(short, long, global = true, value_name = "FILE", env = "QUILLKIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template to stdout
    Render(RenderCommand),

    /// Load a schema (file or literal SQL) into the configured database
    Schema(SchemaCommand),

    /// Run a read query and print the result as JSON
    Query(QueryCommand),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let settings = config.load_settings()?;

        match self.command {
            Commands::Render(cmd) => cmd.execute(&settings),
            Commands::Schema(cmd) => cmd.execute(&settings),
            Commands::Query(cmd) => cmd.execute(&settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_levels() {
        let cli = Cli::parse_from(["quillkit", "--verbose", "schema", "a.sql"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["quillkit", "-q", "schema", "a.sql"]);
        assert_eq!(cli.build_config().log_level, None);

        let cli = Cli::parse_from(["quillkit", "schema", "a.sql", "--config", "site/q.toml"]);
        let config = cli.build_config();
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.config_path, Some(PathBuf::from("site/q.toml")));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["quillkit", "-v", "-q", "schema", "a.sql"]).is_err());
    }

    #[test]
    fn test_explicit_config_is_loaded() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("site.toml");
        std::fs::write(&path, "[app]\nenv = \"prod\"\n").unwrap();

        let config = CliConfig {
            log_level: None,
            config_path: Some(path),
        };
        let settings = config.load_settings().unwrap();
        assert_eq!(settings.app.get("env").and_then(|v| v.as_str()), Some("prod"));
        assert_eq!(settings.search_paths, vec![temp.path().to_path_buf()]);
    }

    #[test]
    #[serial_test::serial]
    fn test_settings_fallback_to_working_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp.path()).unwrap();

        let defaults = CliConfig::new().load_settings().unwrap();
        std::fs::write(DEFAULT_CONFIG_FILE, "[view]\ntemplate_ext = \"html\"\n").unwrap();
        let found = CliConfig::new().load_settings();

        std::env::set_current_dir(previous).unwrap();
        assert_eq!(defaults.search_paths, vec![PathBuf::from(".")]);
        assert_eq!(found.unwrap().view.template_ext, "html");
    }
}
