//! Error handling and custom error types
//!
//! Provides unified error handling across the provider using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// One or more required provider options were absent or blank.
    #[error("Missing required configuration field(s): {}", .0.join(", "))]
    Configuration(Vec<&'static str>),

    #[error("Missing content source: file has neither a buffer nor a stream")]
    MissingContentSource,

    #[error("ImageKit API error: {0}")]
    ImageKit(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL signing error: {0}")]
    Signing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure was reported by (or while talking to) ImageKit.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::ImageKit(_) | Error::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
