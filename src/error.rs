//! Error types and exit codes for zip-meta-map

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for zip-meta-map operations
#[derive(Error, Debug)]
pub enum MetaMapError {
    #[error("Input not found: {path}")]
    InputNotFound { path: String },

    #[error("Input must be a directory or .zip file, got: {path}")]
    UnsupportedInput { path: String },

    #[error("Malformed zip archive: {0}")]
    MalformedArchive(#[from] zip::result::ZipError),

    #[error("Invalid policy document: {message}")]
    InvalidPolicy { message: String },

    #[error("Invalid index document {path}: {message}")]
    InvalidIndex { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetaMapError {
    /// Convert error to an exit code:
    /// - 0: Success
    /// - 1: Input error (missing path, unsupported kind, unreadable file, bad zip)
    /// - 2: Schema error (unparsable policy or index document)
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InputNotFound { .. } => ExitCode::from(1),
            Self::UnsupportedInput { .. } => ExitCode::from(1),
            Self::MalformedArchive(_) => ExitCode::from(1),
            Self::Io(_) => ExitCode::from(1),
            Self::InvalidPolicy { .. } => ExitCode::from(2),
            Self::InvalidIndex { .. } => ExitCode::from(2),
        }
    }
}

/// Result type alias for zip-meta-map operations
pub type Result<T> = std::result::Result<T, MetaMapError>;
