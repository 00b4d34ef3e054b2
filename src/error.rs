//! Error types for chega-check.
//!
//! Check failures are never errors: they become FAIL records. `ChegaError`
//! only covers problems that stop a command from running at all.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChegaError {
    /// The project root does not exist or is not a directory.
    #[error("Project root is not a directory: {}", .path.display())]
    ProjectRootMissing { path: PathBuf },

    /// Configuration file could not be parsed.
    #[error("Failed to parse config at {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// Configuration values are out of range.
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// The report file could not be written.
    #[error("Failed to write report to {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChegaError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ChegaError::ConfigInvalid {
            message: message.into(),
        }
    }
}
