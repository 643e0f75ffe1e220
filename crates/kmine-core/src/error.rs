//! Failure taxonomy shared by the service clients.

use strum::AsRefStr;
use thiserror::Error;

/// Boxed, thread-safe error carried as the cause of an [`Error`].
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What went wrong while talking to a remote service.
///
/// `as_ref()` yields a snake_case label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The service could not be reached.
    NetworkError,
    /// Credentials were missing or rejected (HTTP 401).
    Authentication,
    /// Credentials were valid but lacked access (HTTP 403).
    Authorization,
    /// HTTP 429.
    RateLimited,
    /// HTTP 503.
    ServiceUnavailable,
    /// Any other non-success status.
    ExternalError,
    /// A setting was missing or malformed.
    Configuration,
    /// HTTP 404.
    NotFound,
    Timeout,
    /// A body could not be encoded or decoded.
    Serialization,
}

/// Kind, optional detail and optional cause of a failed remote call.
///
/// Displays as `Kind` or `Kind: message`.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<String>,
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    pub fn authentication() -> Self {
        Self::new(ErrorKind::Authentication)
    }

    pub fn authorization() -> Self {
        Self::new(ErrorKind::Authorization)
    }

    pub fn rate_limited() -> Self {
        Self::new(ErrorKind::RateLimited)
    }

    pub fn service_unavailable() -> Self {
        Self::new(ErrorKind::ServiceUnavailable)
    }

    pub fn external_error() -> Self {
        Self::new(ErrorKind::ExternalError)
    }

    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    pub fn serialization() -> Self {
        Self::new(ErrorKind::Serialization)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the failure came from reaching the remote side at all
    /// (connection, timeout, availability) rather than from its answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NetworkError | ErrorKind::Timeout | ErrorKind::ServiceUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let error = Error::network_error().with_message("connection refused");
        assert_eq!(error.to_string(), "NetworkError: connection refused");
    }

    #[test]
    fn display_without_message_is_kind_only() {
        assert_eq!(Error::timeout().to_string(), "Timeout");
    }

    #[test]
    fn kind_label_is_snake_case() {
        assert_eq!(Error::rate_limited().kind().as_ref(), "rate_limited");
        assert_eq!(Error::service_unavailable().kind().as_ref(), "service_unavailable");
    }

    #[test]
    fn source_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let error = Error::network_error().with_source(io);
        let source = std::error::Error::source(&error).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("reset"));
    }

    #[test]
    fn transport_classification() {
        assert!(Error::timeout().is_transport());
        assert!(Error::network_error().is_transport());
        assert!(!Error::authentication().is_transport());
        assert!(!Error::configuration().is_transport());
    }
}
