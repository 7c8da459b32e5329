//! Error types for the command-line tool.

use std::path::PathBuf;

use masterloop_core::CodecError;
use thiserror::Error;

/// Errors that can occur while running a tool command.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Payload encoding or decoding failed.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Reading or writing a file failed.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON input or output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML template parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Hex input was malformed.
    #[error("Invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Template file extension is neither YAML nor JSON.
    #[error("Unsupported template format: {0}")]
    UnsupportedTemplateFormat(String),
}

impl ToolError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ToolError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for tool commands.
pub type ToolResult<T> = Result<T, ToolError>;
