//! Input error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal problems with the input directory or its files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No .{extension} files found in {dir}")]
    NoInputFiles { dir: PathBuf, extension: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Header of {path} does not match the first input file")]
    SchemaMismatch { path: PathBuf },

    #[error("Invalid income code '{value}' in {path} at row {row}")]
    InvalidIncome {
        path: PathBuf,
        row: usize,
        value: String,
    },
}
