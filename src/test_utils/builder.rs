//! Builder for scratch sites used in tests.
//!
//! A [`TestSite`] is a temporary directory holding templates, theme files and
//! an optional `quillkit.toml`, together with the kernel and view built from
//! them.

use anyhow::Result;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::{Settings, ViewOptions, load_settings};
use crate::core::AppKernel;
use crate::templating::View;

pub struct TestSiteBuilder {
    temp_dir: TempDir,
    config: Value,
    files: Vec<(String, String)>,
    settings: Option<String>,
}

impl TestSiteBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            config: json!({"env": "dev"}),
            files: Vec::new(),
            settings: None,
        })
    }

    /// Kernel configuration exposed as `config.*`.
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    pub fn with_files(mut self, files: Vec<(&str, &str)>) -> Self {
        for (path, content) in files {
            self.files.push((path.to_string(), content.to_string()));
        }
        self
    }

    /// Raw `quillkit.toml` content written at the site root.
    pub fn with_settings(mut self, content: impl Into<String>) -> Self {
        self.settings = Some(content.into());
        self
    }

    pub fn build(self) -> Result<TestSite> {
        let root = self.temp_dir.path().to_path_buf();

        for (path, content) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full_path, content)?;
        }

        let settings_path = root.join("quillkit.toml");
        if let Some(settings) = &self.settings {
            std::fs::write(&settings_path, settings)?;
        }

        Ok(TestSite {
            _temp_dir: self.temp_dir,
            root,
            settings_path,
            config: self.config,
        })
    }
}

pub struct TestSite {
    _temp_dir: TempDir,
    pub root: PathBuf,
    pub settings_path: PathBuf,
    pub config: Value,
}

impl TestSite {
    pub fn builder() -> Result<TestSiteBuilder> {
        TestSiteBuilder::new()
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// A kernel over the builder's configuration, searching the site root.
    pub fn kernel(&self) -> AppKernel {
        AppKernel::new(self.config.clone(), vec![self.root.clone()])
    }

    /// A view over [`TestSite::kernel`] with default options.
    pub fn view(&self) -> View {
        self.view_with(self.kernel(), ViewOptions::default())
    }

    pub fn view_with(&self, kernel: AppKernel, options: ViewOptions) -> View {
        View::new(Arc::new(kernel), options)
    }

    /// Load the site's `quillkit.toml`.
    pub fn settings(&self) -> Result<Settings> {
        load_settings(&self.settings_path)
    }

    pub fn read(&self, path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path().join(path))?)
    }
}
