//! API-key client for an Azure OpenAI resource.

use async_trait::async_trait;
use reqwest::Client;

use super::{CompletionClient, http};
use crate::TRACING_TARGET_CLIENT;
use crate::chat::{ChatCompletion, ChatCompletionRequest};
use crate::config::DirectClientConfig;
use crate::error::Result;

/// Completion client that calls a deployment of an Azure OpenAI resource
/// directly, authenticated with the resource API key.
///
/// The request's `model` names the deployment.
///
/// # Examples
///
/// ```rust,ignore
/// use kmine_azure::{ChatCompletionRequest, ChatMessage, CompletionClient, DirectClient, DirectClientConfig};
///
/// let config = DirectClientConfig::builder()
///     .with_endpoint("https://my-resource.openai.azure.com")
///     .with_api_key(api_key)
///     .build()?;
/// let client = DirectClient::new(config)?;
///
/// let request = ChatCompletionRequest::builder()
///     .with_model("gpt-4o-mini")
///     .with_messages(vec![ChatMessage::user("hello")])
///     .build()?;
/// let completion = client.complete(&request).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectClient {
    http: Client,
    config: DirectClientConfig,
}

impl DirectClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: DirectClientConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            endpoint = config.endpoint(),
            api_key = %config.masked_api_key(),
            api_version = config.api_version(),
            "Creating direct client"
        );

        let http = http::build_http(config.request_timeout())?;
        Ok(Self { http, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &DirectClientConfig {
        &self.config
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion> {
        let url = self.config.chat_completions_url(&request.model)?;
        let builder = self
            .http
            .post(url)
            .header("api-key", self.config.api_key())
            .json(request);
        http::send_json(builder).await
    }
}

#[async_trait]
impl CompletionClient for DirectClient {
    fn provider_name(&self) -> &'static str {
        "azure_openai"
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            deployment = %request.model,
            messages = request.messages.len(),
            data_sources = request.data_sources.len(),
            "Sending chat completion"
        );

        let completion = self.send(request).await.inspect_err(|err| {
            tracing::warn!(
                target: TRACING_TARGET_CLIENT,
                deployment = %request.model,
                error = %err,
                "Chat completion failed"
            );
        })?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            choices = completion.choices.len(),
            "Chat completion received"
        );
        Ok(completion)
    }
}
