//! Pre-issued token supplied through the environment.

use async_trait::async_trait;

use super::{AccessToken, CredentialProvider, TRACING_TARGET};
use crate::error::{Error, Result};

/// Environment variable holding a pre-issued bearer token.
pub const ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Hands out a token obtained elsewhere, e.g. `az account get-access-token`.
///
/// The token is returned for every scope, so it must have been issued for
/// the audience of the endpoint it is used against.
#[derive(Clone, Default)]
pub struct EnvironmentCredential {
    token: Option<String>,
}

impl EnvironmentCredential {
    /// Creates a credential from an explicit token value.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Reads the token from `AZURE_ACCESS_TOKEN`.
    pub fn from_env() -> Self {
        Self::new(std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    /// Returns true if a token is available.
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

impl std::fmt::Debug for EnvironmentCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentCredential")
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for EnvironmentCredential {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| Error::credential(format!("{ACCESS_TOKEN_ENV} is not set")))?;

        tracing::trace!(target: TRACING_TARGET, scope, "Using token from environment");
        Ok(AccessToken::new(token.clone(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_token() {
        let credential = EnvironmentCredential::new(Some("abc".to_string()));
        let token = credential.get_token("scope").await.unwrap();
        assert_eq!(token.token, "abc");
        assert_eq!(token.expires_on, None);
    }

    #[tokio::test]
    async fn blank_token_is_unconfigured() {
        let credential = EnvironmentCredential::new(Some("  ".to_string()));
        assert!(!credential.is_configured());
        let err = credential.get_token("scope").await.unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }
}
