//! Errors reported by the data-access layer.
//!
//! Two families are kept apart:
//! - **Contract violations** ([`DbError::InvalidArgument`]): the caller asked
//!   for something that can never work, such as caching a non-read method.
//! - **Execution failures** ([`DbError::Prepare`], [`DbError::Execution`] and
//!   the schema variants): the driver rejected a statement. These are also
//!   recorded in [`crate::db::ExecutionStats::last_error`].

use std::path::PathBuf;
use thiserror::Error;

use super::driver::DriverError;

#[derive(Error, Debug)]
pub enum DbError {
    /// A caller-supplied argument is outside the accepted set.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong and what is accepted
        message: String,
    },

    /// The database could not be opened.
    #[error("Failed to open database: {path}")]
    Open {
        /// Path (or `:memory:`) that failed to open
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The driver could not compile the statement.
    #[error("Failed to prepare statement: {sql}")]
    Prepare {
        /// Normalized SQL text
        sql: String,
        #[source]
        source: DriverError,
    },

    /// The driver failed while binding or executing the statement.
    #[error("Failed to execute statement: {sql}")]
    Execution {
        /// Normalized SQL text
        sql: String,
        #[source]
        source: DriverError,
    },

    /// A schema file could not be read.
    #[error("Failed to read schema file: {}", path.display())]
    SchemaRead {
        /// Schema file path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A schema statement failed; later statements were not run.
    #[error("Schema statement {index} failed")]
    SchemaStatement {
        /// One-based position of the failing statement
        index: usize,
        #[source]
        source: Box<DbError>,
    },
}

impl DbError {
    /// Whether this error is a misuse of the API rather than a driver failure.
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self, DbError::InvalidArgument { .. })
    }

    /// Whether this error came from the driver rejecting a statement.
    pub fn is_execution_failure(&self) -> bool {
        match self {
            DbError::Prepare { .. } | DbError::Execution { .. } => true,
            DbError::SchemaStatement { source, .. } => source.is_execution_failure(),
            _ => false,
        }
    }

    /// One-line description including the driver's own message.
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = err.source();
        }
        message
    }
}
