//! Client scoped to an Azure AI project.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use kmine_core::IntoProvider;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

use super::{CompletionClient, http};
use crate::TRACING_TARGET_CLIENT;
use crate::chat::{ChatCompletion, ChatCompletionRequest};
use crate::config::ProjectClientConfig;
use crate::credentials::{
    AccessToken, COGNITIVE_SERVICES_SCOPE, CredentialProvider, MANAGEMENT_SCOPE,
};
use crate::error::{Error, Result};

/// Azure AI model inference API version.
const INFERENCE_API_VERSION: &str = "2024-05-01-preview";

/// Resource Manager endpoint and API version for project connections.
const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const CONNECTIONS_API_VERSION: &str = "2024-07-01-preview";

/// Connection category holding the project's AI Services resource.
const AI_SERVICES_CATEGORY: &str = "AIServices";

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    value: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    name: String,
    properties: ConnectionProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionProperties {
    #[serde(default)]
    category: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    is_default: bool,
}

/// Picks the default AI Services connection and derives its model
/// inference endpoint (`{target}/models`).
fn inference_endpoint_from(list: ConnectionList) -> Result<String> {
    let mut candidates: Vec<Connection> = list
        .value
        .into_iter()
        .filter(|c| c.properties.category.eq_ignore_ascii_case(AI_SERVICES_CATEGORY))
        .filter(|c| c.properties.target.is_some())
        .collect();

    if candidates.is_empty() {
        return Err(Error::config(
            "project has no AI Services connection to send completions to",
        ));
    }

    let position = candidates
        .iter()
        .position(|c| c.properties.is_default)
        .unwrap_or(0);

    let connection = candidates.swap_remove(position);
    let target = connection.properties.target.unwrap_or_default();
    tracing::debug!(
        target: TRACING_TARGET_CLIENT,
        connection = %connection.name,
        "Using project AI Services connection"
    );
    Ok(format!("{}/models", target.trim_end_matches('/')))
}

/// Builds `{inference_endpoint}/chat/completions?api-version=...`.
fn chat_completions_url(inference_endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(inference_endpoint)?;
    url.path_segments_mut()
        .map_err(|_| Error::config(format!("endpoint cannot be a base: {inference_endpoint}")))?
        .pop_if_empty()
        .extend(["chat", "completions"]);
    url.query_pairs_mut()
        .append_pair("api-version", INFERENCE_API_VERSION);
    Ok(url)
}

/// Completion client that authenticates with Microsoft Entra ID and calls
/// the model inference endpoint of an Azure AI project.
///
/// The inference endpoint is taken from the configuration or discovered once
/// from the project's connections; tokens are cached until shortly before
/// they expire.
pub struct ProjectClient {
    http: Client,
    config: ProjectClientConfig,
    credential: Arc<dyn CredentialProvider>,
    endpoint: OnceCell<Url>,
    tokens: Mutex<HashMap<&'static str, AccessToken>>,
}

impl ProjectClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ProjectClientConfig, credential: Arc<dyn CredentialProvider>) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            project = %config.connection().project_name,
            host = %config.connection().host,
            credential = credential.name(),
            discovery = config.inference_endpoint().is_none(),
            "Creating project client"
        );

        let http = http::build_http(config.request_timeout())?;
        Ok(Self {
            http,
            config,
            credential,
            endpoint: OnceCell::new(),
            tokens: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ProjectClientConfig {
        &self.config
    }

    /// Returns a valid bearer token for the scope, refreshing it if needed.
    async fn bearer(&self, scope: &'static str) -> Result<String> {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.get(scope).filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        let token = self.credential.get_token(scope).await?;
        let value = token.token.clone();
        tokens.insert(scope, token);
        Ok(value)
    }

    /// Returns the chat completions URL, discovering the endpoint on first use.
    async fn completions_url(&self) -> Result<&Url> {
        self.endpoint
            .get_or_try_init(|| async {
                let endpoint = match self.config.inference_endpoint() {
                    Some(endpoint) => endpoint.to_string(),
                    None => self.discover_endpoint().await?,
                };
                chat_completions_url(&endpoint)
            })
            .await
    }

    async fn discover_endpoint(&self) -> Result<String> {
        let connection = self.config.connection();
        let mut url = Url::parse(MANAGEMENT_ENDPOINT)?;
        url.set_path(&format!("{}/connections", connection.workspace_path()));
        url.query_pairs_mut()
            .append_pair("api-version", CONNECTIONS_API_VERSION)
            .append_pair("category", AI_SERVICES_CATEGORY)
            .append_pair("includeAll", "true");

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            project = %connection.project_name,
            "Discovering project inference endpoint"
        );

        let token = self.bearer(MANAGEMENT_SCOPE).await?;
        let list: ConnectionList = http::send_json(self.http.get(url).bearer_auth(token)).await?;
        inference_endpoint_from(list)
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion> {
        let url = self.completions_url().await?.clone();
        let token = self.bearer(COGNITIVE_SERVICES_SCOPE).await?;
        let builder = self.http.post(url).bearer_auth(token).json(request);
        http::send_json(builder).await
    }
}

impl std::fmt::Debug for ProjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectClient")
            .field("config", &self.config)
            .field("credential", &self.credential.name())
            .field("endpoint", &self.endpoint.get().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IntoProvider for ProjectClient {
    type Credentials = Arc<dyn CredentialProvider>;
    type Params = ProjectClientConfig;

    async fn create(
        params: Self::Params,
        credentials: Self::Credentials,
    ) -> kmine_core::Result<Self> {
        Ok(Self::new(params, credentials)?)
    }
}

#[async_trait]
impl CompletionClient for ProjectClient {
    fn provider_name(&self) -> &'static str {
        "azure_ai_project"
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            model = %request.model,
            messages = request.messages.len(),
            "Sending project chat completion"
        );

        let completion = self.send(request).await.inspect_err(|err| {
            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                model = %request.model,
                error = %err,
                "Project chat completion failed"
            );
        })?;

        Ok(completion)
    }
}
