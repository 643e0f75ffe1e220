//! Error types for kmine-rig.

use std::fmt;

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while answering a question.
///
/// Tools never return these to their callers; each tool turns them into an
/// answer at its boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Completion provider failed (unreachable, rejected, timed out).
    #[error("provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    /// Relational executor failed.
    #[error("executor error: {0}")]
    Executor(String),

    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider answered without any choice.
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// Lower-level structured error.
    #[error(transparent)]
    Core(#[from] kmine_core::Error),
}

impl Error {
    /// Creates a provider error.
    pub fn provider(provider: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Provider {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates an executor error.
    pub fn executor(message: impl fmt::Display) -> Self {
        Self::Executor(message.to_string())
    }

    /// Creates a configuration error.
    pub fn config(message: impl fmt::Display) -> Self {
        Self::Config(message.to_string())
    }

    /// Creates an empty-response error.
    pub fn empty_response(provider: impl fmt::Display) -> Self {
        Self::EmptyResponse(provider.to_string())
    }

    /// Returns true if the failure happened before the provider answered.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Core(err) => err.is_transport(),
            _ => false,
        }
    }
}

impl From<kmine_azure::Error> for Error {
    fn from(err: kmine_azure::Error) -> Self {
        Self::Core(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_display_transparently() {
        let err: Error = kmine_core::Error::network_error()
            .with_message("connection refused")
            .into();
        assert_eq!(err.to_string(), "NetworkError: connection refused");
        assert!(err.is_transport());
    }

    #[test]
    fn azure_errors_convert_through_core() {
        let err: Error = kmine_azure::Error::config("bad endpoint").into();
        assert!(matches!(err, Error::Core(_)));
        assert_eq!(err.to_string(), "Configuration: bad endpoint");
    }

    #[test]
    fn constructors_format_messages() {
        assert_eq!(
            Error::provider("azure_openai", "boom").to_string(),
            "provider error: azure_openai: boom"
        );
        assert_eq!(Error::executor("timeout").to_string(), "executor error: timeout");
        assert!(!Error::config("x").is_transport());
    }
}
