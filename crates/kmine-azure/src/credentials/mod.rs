//! Microsoft Entra ID token acquisition for project-scoped clients.
//!
//! A [`CredentialProvider`] exchanges a scope for a bearer token. The
//! [`DefaultCredential`] chain tries a pre-issued token from the environment
//! first and falls back to the managed identity of the hosting compute.

mod chain;
mod environment;
mod managed_identity;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
pub use chain::DefaultCredential;
pub use environment::EnvironmentCredential;
pub use managed_identity::ManagedIdentityCredential;

use crate::error::Result;

/// Tracing target for credential acquisition.
pub const TRACING_TARGET: &str = "kmine_azure::credentials";

/// Scope for Azure AI inference endpoints.
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// Scope for Azure Resource Manager.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// A bearer token with its expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw token value.
    pub token: String,
    /// Expiry as seconds since the Unix epoch; `None` when unknown.
    pub expires_on: Option<u64>,
}

impl AccessToken {
    /// Creates a token.
    pub fn new(token: impl Into<String>, expires_on: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }

    /// Returns true if the token is expired or about to expire.
    ///
    /// Tokens without a known expiry never expire.
    pub fn is_expired(&self) -> bool {
        let Some(expires_on) = self.expires_on else {
            return false;
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        now + EXPIRY_MARGIN.as_secs() >= expires_on
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &crate::config::mask_secret(&self.token))
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens.
#[async_trait]
pub trait CredentialProvider: fmt::Debug + Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Acquires a token for the given scope.
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// Converts a `.default` scope into the resource identifier expected by
/// managed identity endpoints.
pub(crate) fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}
