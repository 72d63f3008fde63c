use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in gutenshelf-core.
#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid book id: {0}")]
    InvalidBookId(String),

    #[error("Unknown sort order: {0}")]
    UnknownSortOrder(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Failure reading or writing the local key-value area.
///
/// Never fatal: the favorites store reports it and keeps going on its
/// in-memory copy.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read key {key:?} from {path}: {source}")]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key {key:?} to {path}: {source}")]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for key {key:?} is not valid: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, ShelfError>;
