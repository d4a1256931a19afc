//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! The `Display` text of the pipeline variants is the message shown to the
//! end user, so it is kept free of type names and debug formatting.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to fetch image from URL: {0}")]
    Fetch(String),

    #[error("URL does not point to a valid image type.")]
    UnsupportedMedia,

    #[error("{0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_message_includes_reason() {
        let err = Error::Fetch("Not Found".to_string());
        assert_eq!(err.to_string(), "Failed to fetch image from URL: Not Found");
    }

    #[test]
    fn test_unsupported_media_message() {
        assert_eq!(
            Error::UnsupportedMedia.to_string(),
            "URL does not point to a valid image type."
        );
    }
}
