//! Error types and handling for the settings migration library
//! Author: kartik4091
//! Created: 2025-06-03

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Custom result type for migration operations
pub type Result<T> = StdResult<T, Error>;

/// Core error type for migration operations
#[derive(Error, Debug)]
#[non_exhaustive]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid connection string: {0}")]
    InvalidConnInfo(String),

    #[error("Server version {found} does not support ALTER SYSTEM (requires {required} or later)")]
    UnsupportedServerVersion { found: i32, required: i32 },

    #[error("Cannot scale value '{value}' of {name}: not an integer")]
    ScaleError { name: String, value: String },

    #[error("Invalid setting name: {0}")]
    InvalidSettingName(String),

    #[error("Report error: {0}")]
    ReportError(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ReportError(err.to_string())
    }
}
