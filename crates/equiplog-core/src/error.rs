use std::path::PathBuf;

use equiplog_parser::ParserError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("'{0}' is not a .csv file")]
    UnsupportedFile(String),

    #[error("'{filename}' is not valid UTF-8: {source}")]
    InvalidEncoding {
        filename: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("parse failed: {0}")]
    Parse(#[from] ParserError),

    #[error("save failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session is already signed out")]
    NotSignedIn,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
