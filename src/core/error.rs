//! User-facing error reporting.
//!
//! Library code returns the typed errors of each layer
//! ([`crate::db::DbError`], [`crate::templating::ViewError`]). The CLI works
//! with [`anyhow::Error`] and, on failure, turns it into an [`ErrorContext`]
//! with [`user_friendly_error`]: a short classification ([`QuillError`]),
//! optional details and an actionable suggestion, printed in color.
//!
//! # Examples
//!
//! ```rust,no_run
//! use quillkit::core::user_friendly_error;
//!
//! let error = anyhow::anyhow!("Something went wrong");
//! user_friendly_error(error).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::db::DbError;
use crate::templating::ViewError;

/// Classified failure shown to CLI users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuillError {
    #[error("Settings file not found: {path}")]
    ConfigNotFound {
        path: String,
    },

    #[error("Invalid settings file {file}: {reason}")]
    ConfigParseError {
        file: String,
        reason: String,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
    },

    #[error("Database error: {message}")]
    Database {
        message: String,
    },

    #[error("Template {name} not found")]
    TemplateNotFound {
        name: String,
    },

    #[error("Theme layout not found: {path}")]
    LayoutNotFound {
        path: String,
    },

    #[error("Template rendering failed: {message}")]
    Render {
        message: String,
    },

    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        operation: String,
        path: String,
    },

    #[error("Permission denied during {operation}: {path}")]
    PermissionDenied {
        operation: String,
        path: String,
    },

    #[error("{message}")]
    Other {
        message: String,
    },
}

/// A [`QuillError`] with optional details and a suggestion.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: QuillError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: QuillError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion.
///
/// The cause chain is searched for the crate's own error types first, then
/// for I/O and TOML errors. Anything else is reported with its full chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(context) = error.chain().find_map(|e| e.downcast_ref::<ErrorContext>()) {
        return ErrorContext {
            error: context.error.clone(),
            suggestion: context.suggestion.clone(),
            details: context.details.clone(),
        };
    }

    if let Some(db_error) = error.chain().find_map(|e| e.downcast_ref::<DbError>()) {
        return db_error_context(db_error);
    }

    if let Some(view_error) = error.chain().find_map(|e| e.downcast_ref::<ViewError>()) {
        return view_error_context(view_error);
    }

    if let Some(toml_error) = error.chain().find_map(|e| e.downcast_ref::<toml::de::Error>()) {
        return ErrorContext::new(QuillError::ConfigParseError {
            file: error.to_string(),
            reason: toml_error.message().to_string(),
        })
        .with_suggestion("Check the TOML syntax and that every key belongs to a known section")
        .with_details("Unknown keys in [view] and [database] are rejected");
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(QuillError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(QuillError::FileSystemError {
                    operation: "file access".to_string(),
                    path: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    ErrorContext::new(QuillError::Other {
        message,
    })
}

fn db_error_context(error: &DbError) -> ErrorContext {
    match error {
        DbError::InvalidArgument {
            message,
        } => ErrorContext::new(QuillError::InvalidArgument {
            message: message.clone(),
        })
        .with_suggestion("Use one of get_var, get_row, get_col or get_results"),
        DbError::SchemaRead {
            path,
            ..
        } => ErrorContext::new(QuillError::FileSystemError {
            operation: "schema read".to_string(),
            path: path.display().to_string(),
        })
        .with_suggestion("Pass a readable schema file, or literal SQL containing whitespace"),
        DbError::SchemaStatement {
            index,
            ..
        } => ErrorContext::new(QuillError::Database {
            message: error.detailed(),
        })
        .with_details(format!("Statements before #{} were applied; later ones were not run", index))
        .with_suggestion("Fix the failing statement and load the schema again"),
        _ => ErrorContext::new(QuillError::Database {
            message: error.detailed(),
        })
        .with_suggestion("Check the SQL syntax and that referenced tables and columns exist"),
    }
}

fn view_error_context(error: &ViewError) -> ErrorContext {
    match error {
        ViewError::TemplateNotFound {
            name,
        } => ErrorContext::new(QuillError::TemplateNotFound {
            name: name.clone(),
        })
        .with_suggestion("Check the template name and the configured search_paths"),
        ViewError::LayoutNotFound {
            path,
            ..
        } => ErrorContext::new(QuillError::LayoutNotFound {
            path: path.clone(),
        })
        .with_suggestion("Create the layout file or unset `theme` in the [app] settings"),
        ViewError::InvalidAssetKind {
            supported,
            ..
        } => ErrorContext::new(QuillError::InvalidArgument {
            message: error.to_string(),
        })
        .with_suggestion(format!("Use one of: {}", supported)),
        _ => ErrorContext::new(QuillError::Render {
            message: error.to_string(),
        })
        .with_suggestion(
            "Check template syntax: variables use {{ var }}, control flow uses {% %}, \
             and functions take named arguments such as data(key=\"title\")",
        ),
    }
}
