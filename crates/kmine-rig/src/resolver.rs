//! Selection between the direct and the project-scoped completion client.

use std::sync::Arc;

use async_trait::async_trait;
use kmine_azure::credentials::{CredentialProvider, DefaultCredential};
use kmine_azure::{CompletionClient, DirectClient, ProjectClient};
use kmine_core::IntoProvider;

use crate::{ChatWithDataConfig, Result, TRACING_TARGET_RESOLVER};

/// Builds completion clients for the tools.
///
/// Every call builds a fresh client; nothing is cached between invocations.
#[async_trait]
pub trait ClientResolver: Send + Sync {
    /// Returns the client selected by `use_ai_project_client`.
    async fn resolve(&self) -> Result<Box<dyn CompletionClient>>;

    /// Returns the API-key client regardless of `use_ai_project_client`.
    async fn resolve_direct(&self) -> Result<Box<dyn CompletionClient>>;
}

/// Resolver backed by Azure OpenAI and Azure AI projects.
#[derive(Clone)]
pub struct AzureClientResolver {
    config: Arc<ChatWithDataConfig>,
    credential: Option<Arc<dyn CredentialProvider>>,
}

impl AzureClientResolver {
    /// Creates a resolver that authenticates project clients with the
    /// default credential chain.
    pub fn new(config: Arc<ChatWithDataConfig>) -> Self {
        Self {
            config,
            credential: None,
        }
    }

    /// Uses the given credential for project clients.
    pub fn with_credential(mut self, credential: Arc<dyn CredentialProvider>) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ChatWithDataConfig {
        &self.config
    }

    fn credential(&self) -> Arc<dyn CredentialProvider> {
        match &self.credential {
            Some(credential) => credential.clone(),
            None => Arc::new(DefaultCredential::from_env()),
        }
    }

    async fn project_client(&self) -> Result<Box<dyn CompletionClient>> {
        let params = self.config.project_client_config()?;
        let client = ProjectClient::create(params, self.credential()).await?;
        Ok(Box::new(client))
    }

    fn direct_client(&self) -> Result<Box<dyn CompletionClient>> {
        let client = DirectClient::new(self.config.direct_client_config()?)?;
        Ok(Box::new(client))
    }
}

impl std::fmt::Debug for AzureClientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureClientResolver")
            .field("use_ai_project_client", &self.config.use_ai_project_client)
            .field("credential", &self.credential.as_ref().map(|c| c.name()))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ClientResolver for AzureClientResolver {
    async fn resolve(&self) -> Result<Box<dyn CompletionClient>> {
        if self.config.use_ai_project_client {
            tracing::debug!(target: TRACING_TARGET_RESOLVER, mode = "project", "Resolving completion client");
            self.project_client().await
        } else {
            self.resolve_direct().await
        }
    }

    async fn resolve_direct(&self) -> Result<Box<dyn CompletionClient>> {
        tracing::debug!(target: TRACING_TARGET_RESOLVER, mode = "direct", "Resolving completion client");
        self.direct_client()
    }
}
