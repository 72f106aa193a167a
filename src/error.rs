//! Container and configuration error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for container operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while reading, writing or copying containers
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] yaml_serde::Error),

    /// No group or dataset at this path
    #[error("no such item: {0}")]
    NotFound(String),

    #[error("not a dataset: {0}")]
    NotADataset(String),

    #[error("not a group: {0}")]
    NotAGroup(String),

    /// Copy source and destination resolve to the same file
    #[error("source and destination are the same file: {}", .0.display())]
    SameFile(PathBuf),

    /// Neither a column label nor a valid column index
    #[error("no column {0:?}")]
    UnknownColumn(String),

    /// Only 1-D and 2-D datasets can be split into columns
    #[error("rank {0} datasets are not supported")]
    Rank(usize),

    /// Stored values do not fill the declared shape
    #[error("{path}: shape needs {expected} values, found {actual}")]
    Shape {
        path: String,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported container format: {0}")]
    Unsupported(String),
}
