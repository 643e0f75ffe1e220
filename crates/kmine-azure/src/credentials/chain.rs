//! Ordered credential fallback.

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    AccessToken, CredentialProvider, EnvironmentCredential, ManagedIdentityCredential,
    TRACING_TARGET,
};
use crate::error::{Error, Result};

/// Tries each provider in order and returns the first token obtained.
#[derive(Debug, Clone)]
pub struct DefaultCredential {
    providers: Vec<Arc<dyn CredentialProvider>>,
}

impl DefaultCredential {
    /// Creates a chain from explicit providers.
    pub fn new(providers: Vec<Arc<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment token first, then managed identity.
    pub fn from_env() -> Self {
        let mut providers: Vec<Arc<dyn CredentialProvider>> = Vec::with_capacity(2);
        let environment = EnvironmentCredential::from_env();
        if environment.is_configured() {
            providers.push(Arc::new(environment));
        }
        providers.push(Arc::new(ManagedIdentityCredential::from_env()));
        Self::new(providers)
    }
}

#[async_trait]
impl CredentialProvider for DefaultCredential {
    fn name(&self) -> &'static str {
        "default"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.get_token(scope).await {
                Ok(token) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        provider = provider.name(),
                        scope,
                        "Acquired access token"
                    );
                    return Ok(token);
                }
                Err(err) => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        provider = provider.name(),
                        error = %err,
                        "Credential provider failed"
                    );
                    failures.push(format!("{}: {}", provider.name(), err));
                }
            }
        }

        if failures.is_empty() {
            return Err(Error::credential("no credential providers configured"));
        }
        Err(Error::credential(format!(
            "no credential succeeded ({})",
            failures.join("; ")
        )))
    }
}
