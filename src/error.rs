//! Error types for IFC Query.
//!
//! Spatial resolution itself never fails; these cover the file, config and
//! export edges around it.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a model. Undecodable single statements are
/// skipped rather than reported.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read IFC file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The text is not an ISO-10303-21 exchange file.
    #[error("not a STEP physical file: {message}")]
    InvalidStep { message: String },
}

/// Errors raised while loading a `--config` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for [`crate::config::QueryConfig`].
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot create export file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or flushing an already created file failed.
    #[error("cannot write export file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("report is not serializable as JSON: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("element table row rejected: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },
}
