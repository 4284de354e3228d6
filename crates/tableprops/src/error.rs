//! Error types for the command-line tool.

use std::path::PathBuf;

use tableprops_core::ConfigError;

/// Errors raised while loading, converting or writing configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The configuration itself is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A file could not be read or written.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing to standard output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// A YAML file could not be parsed or rendered.
    #[error("YAML error in '{path}': {source}")]
    Yaml {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A JSON file could not be parsed or rendered.
    #[error("JSON error in '{path}': {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The file extension is neither YAML nor JSON.
    #[error("Unsupported file format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    /// The output file exists and overwriting was not requested.
    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(PathBuf),

    /// The current config has no user keyspaces.
    #[error("No keyspaces found in {0}")]
    NoKeyspaces(String),

    /// A row export does not have the expected layout.
    #[error("Invalid row export '{path}': {message}")]
    InvalidExport {
        /// Export file.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// The log subscriber could not be installed.
    #[error("Failed to set up logging: {0}")]
    Logging(String),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
