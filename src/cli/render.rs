//! The `render` command.

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::core::AppKernel;
use crate::templating::View;

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Template name, resolved against the search paths
    #[arg(value_name = "TEMPLATE")]
    template: String,

    /// JSON file with an object merged into the view data
    #[arg(long, value_name = "JSON_FILE")]
    data: Option<PathBuf>,

    /// Render as a full page (theme layout, head injection, output filter)
    #[arg(long)]
    primary: bool,
}

impl RenderCommand {
    pub fn execute(self, settings: &Settings) -> Result<()> {
        let data = match &self.data {
            Some(path) => read_data_file(path)?,
            None => Map::new(),
        };

        let kernel = AppKernel::from_settings(settings);
        let view = View::new(Arc::new(kernel), settings.view.clone());

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        view.tpl(&self.template, data, self.primary, &mut out)
            .with_context(|| format!("Failed to render {}", self.template))?;
        Ok(())
    }
}

fn read_data_file(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse data file: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "Data file {} must contain a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_file_must_be_object() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("data.json");

        std::fs::write(&path, r#"{"title": "Hi"}"#).unwrap();
        assert_eq!(read_data_file(&path).unwrap().get("title"), Some(&Value::from("Hi")));

        std::fs::write(&path, "[1, 2]").unwrap();
        let err = read_data_file(&path).unwrap_err();
        assert!(err.to_string().contains("found an array"));
    }
}
