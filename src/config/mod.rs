//! Configuration for quillkit applications.
//!
//! A single TOML settings file drives both layers of the toolkit:
//!
//! ```toml
//! # Search roots used by the path collaborator, in priority order
//! search_paths = ["site", "modules"]
//!
//! # Free-form application configuration, surfaced through `Kernel::config`
//! [app]
//! name = "Demo App"
//! base_url = "https://example.com"
//! env = "dev"
//! theme = "theme"
//! modules_dir = "modules"
//!
//! [app.route]
//! path = "/home"
//!
//! # View layer options
//! [view]
//! template_ext = "tpl"
//! layout = "layout.tpl"
//!
//! # Data layer options
//! [database]
//! path = "data/app.sqlite"
//! schema = "data/schema.sql"
//! ```
//!
//! Every recognised option is enumerated by a struct below. Unknown keys in
//! the typed sections are rejected at parse time (`deny_unknown_fields`); only
//! the `[app]` table is free-form.

mod parser;

pub use parser::{load_settings, parse_config};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Top-level settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Application configuration exposed to templates via `data('config.*')`.
    #[serde(default)]
    pub app: toml::Table,

    /// Directories searched (in order) when resolving relative names.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// View layer options.
    #[serde(default)]
    pub view: ViewOptions,

    /// Data layer options.
    #[serde(default)]
    pub database: DatabaseOptions,
}

impl Settings {
    /// The `[app]` table as a JSON object.
    pub fn app_config(&self) -> Value {
        serde_json::to_value(&self.app).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Options recognised by [`crate::templating::View`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewOptions {
    /// Extension appended to template names that have none.
    pub template_ext: String,

    /// Layout file inside the active theme used for primary renders.
    pub layout: String,

    /// Directory inside the theme scanned for function templates.
    pub functions_dir: String,

    /// Global assigned from the `js` data bucket on primary renders.
    pub page_data_var: String,

    /// Default for the `time` option passed to the URL collaborator.
    pub url_time: bool,

    /// View data present before the first render.
    pub data: Map<String, Value>,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            template_ext: "tpl".to_string(),
            layout: "layout.tpl".to_string(),
            functions_dir: "functions".to_string(),
            page_data_var: "pageData".to_string(),
            url_time: true,
            data: Map::new(),
        }
    }
}

/// Options recognised by [`crate::db::Db`] when opened from settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseOptions {
    /// SQLite database file, or `:memory:`. `None` opens an in-memory database.
    pub path: Option<PathBuf>,

    /// Schema (file path or literal SQL) loaded right after opening.
    pub schema: Option<String>,
}
