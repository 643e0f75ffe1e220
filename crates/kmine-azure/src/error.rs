//! Internal error types for kmine-azure.

use thiserror::Error;

/// Result type alias for kmine-azure operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for kmine-azure operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Endpoint could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },
    /// Client configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// No usable credential could be obtained.
    #[error("Credential error: {0}")]
    Credential(String),
}

impl Error {
    /// Creates an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Self::Config(message)
    }
}

impl From<Error> for kmine_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    kmine_core::Error::timeout()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_connect() {
                    kmine_core::Error::network_error()
                        .with_message(format!("Connection failed: {e}"))
                        .with_source(e)
                } else if e.is_decode() {
                    kmine_core::Error::serialization()
                        .with_message(e.to_string())
                        .with_source(e)
                } else {
                    kmine_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => kmine_core::Error::serialization()
                .with_message(e.to_string())
                .with_source(e),
            Error::Url(e) => kmine_core::Error::configuration()
                .with_message(format!("invalid endpoint: {e}"))
                .with_source(e),
            Error::Api { status, message } => {
                let error = match status {
                    401 => kmine_core::Error::authentication(),
                    403 => kmine_core::Error::authorization(),
                    404 => kmine_core::Error::not_found(),
                    408 => kmine_core::Error::timeout(),
                    429 => kmine_core::Error::rate_limited(),
                    503 => kmine_core::Error::service_unavailable(),
                    _ => kmine_core::Error::external_error(),
                };
                error.with_message(format!("{status}: {message}"))
            }
            Error::Config(message) => kmine_core::Error::configuration().with_message(message),
            Error::Credential(message) => {
                kmine_core::Error::authentication().with_message(message)
            }
        }
    }
}
