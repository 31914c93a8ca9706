//! Error types for the compiler

use std::path::PathBuf;
use thiserror::Error;

/// A step that cannot be compiled
///
/// Only ever affects the one step; the script still compiles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The handler needs an element but the step has no usable selector
    #[error("{step_type} is missing a selector")]
    MissingSelector { step_type: String },

    /// A field the handler needs is absent or empty
    #[error("{step_type} is missing '{field}'")]
    MissingField {
        step_type: String,
        field: &'static str,
    },

    /// The step's JSON does not match the step schema
    #[error("malformed step: {message}")]
    Malformed { message: String },
}

/// A recording file that cannot be converted
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to list recordings in {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse recording {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write script {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid recording file name: {path}")]
    InvalidName { path: PathBuf },
}
