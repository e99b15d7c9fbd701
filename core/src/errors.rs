use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur with finding the config directory.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Unable to find the config directory for ornitag.")]
    Config,
}

/// Fatal problems with the metadata spreadsheet.
///
/// Any of these aborts the run before a single photo is looked at.
/// Row numbers are 1-based, as shown by spreadsheet applications.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Spreadsheet not found: {0}")]
    NotFound(PathBuf),
    #[error("Unable to open spreadsheet {path}: {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("Unable to read sheet \"{sheet}\": {reason}")]
    Read { sheet: String, reason: String },
    #[error("Spreadsheet is missing the required sheet \"{0}\"")]
    MissingSheet(String),
    #[error("Birds row {row}: bird names are present but the code is empty")]
    MissingBirdCode { row: usize },
    #[error("Birds row {row}: bird \"{code}\" is missing its {field}")]
    IncompleteBird {
        row: usize,
        code: String,
        field: &'static str,
    },
    #[error("Tags row {row}: tags are present but the code is empty")]
    MissingTagCode { row: usize },
}

/// Errors reported by the remote photo service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Photo service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Photo service rejected the auth token")]
    Unauthorized,
    #[error("Photo service rate limit exceeded")]
    RateLimited,
    #[error("Unable to read the auth token from {path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("The auth token file {0} is empty")]
    EmptyToken(PathBuf),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    /// A 4xx response that explained itself with an `error` or `message` field.
    #[error("Photo service rejected the request: {0}")]
    Rejected(String),
}
