use streams_resolver::{
    directory::DirectoryError,
    extractor::{ExtractionError, ResolveError},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CliError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unknown_country(name: impl Into<String>) -> Self {
        Self::UnknownCountry(name.into())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
