//! Errors raised by the view layer.
//!
//! Contract violations (unknown asset kind, unresolvable template or layout)
//! abort the current render. Soft misses such as an absent data path or a
//! dequeue of an unknown id are not errors at all.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    /// `queue`/`dequeue` was called with a category outside the fixed set.
    #[error("Asset queue only supports the following types: {supported} (got '{kind}')")]
    InvalidAssetKind {
        kind: String,
        supported: String,
    },

    /// A named (partial) template could not be resolved.
    #[error("Template {name} not found")]
    TemplateNotFound {
        name: String,
    },

    /// The active theme has no layout file.
    #[error("Theme layout not found: {path}")]
    LayoutNotFound {
        /// Theme name from configuration
        theme: String,
        /// Layout path that failed to resolve
        path: String,
    },

    /// Tera failed to parse or render a template.
    #[error("Failed to render template '{template}': {message}")]
    Render {
        template: String,
        message: String,
    },

    /// A template or function file could not be read.
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Walking the theme's functions directory failed.
    #[error("Failed to scan theme functions in {}: {message}", path.display())]
    ThemeScan {
        path: PathBuf,
        message: String,
    },

    /// The output sink rejected the rendered page.
    #[error("Failed to write rendered output")]
    Write(#[source] std::io::Error),
}

impl ViewError {
    /// Whether this error is a misuse of the API (bad kind, missing template)
    /// rather than a failure inside a template or the filesystem.
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ViewError::InvalidAssetKind { .. }
                | ViewError::TemplateNotFound { .. }
                | ViewError::LayoutNotFound { .. }
        )
    }

    /// Convert a Tera error, keeping every message in its source chain.
    pub(crate) fn from_tera(template: &str, error: &tera::Error) -> Self {
        ViewError::Render {
            template: template.to_string(),
            message: format_tera_error(error),
        }
    }
}

/// Flatten a Tera error chain into one readable message.
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        let message = err.to_string();
        if !message.trim().is_empty() && !messages.contains(&message) {
            messages.push(message);
        }
        current = err.source();
    }
    messages.join("\n  → ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ViewError::InvalidAssetKind {
            kind: "font".into(),
            supported: "canonical, manifest, favicon, css, js".into(),
        };
        assert!(err.is_contract_violation());
        assert_eq!(
            err.to_string(),
            "Asset queue only supports the following types: canonical, manifest, favicon, css, js (got 'font')"
        );

        let err = ViewError::TemplateNotFound {
            name: "home".into(),
        };
        assert_eq!(err.to_string(), "Template home not found");

        let err = ViewError::LayoutNotFound {
            theme: "theme".into(),
            path: "modules/theme/layout.tpl".into(),
        };
        assert!(err.to_string().contains("modules/theme/layout.tpl"));
    }

    #[test]
    fn test_render_error_keeps_chain() {
        let mut tera = tera::Tera::default();
        let err = tera.add_raw_template("broken", "{{ oops").unwrap_err();
        let view_err = ViewError::from_tera("broken", &err);

        assert!(!view_err.is_contract_violation());
        assert!(view_err.to_string().starts_with("Failed to render template 'broken'"));
    }
}
