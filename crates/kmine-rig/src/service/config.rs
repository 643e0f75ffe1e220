//! Configuration shared by the chat-with-data tools.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use kmine_azure::{
    AzureSearchParameters, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS, DirectClientConfig,
    ProjectClientConfig, ProjectConnectionString, mask_secret,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    pub const SEMANTIC_CONFIGURATION: &str = "my-semantic-config";
    pub const EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
}

/// Reads an on/off setting: only `true`, in any letter case, turns it on.
#[cfg(feature = "config")]
fn parse_flag(value: &str) -> std::result::Result<bool, std::convert::Infallible> {
    Ok(value.eq_ignore_ascii_case("true"))
}

/// Endpoints, keys and model identifiers of the chat-with-data tools.
///
/// Built once at process start and shared read-only by every tool.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ChatWithDataConfig {
    /// Azure OpenAI resource endpoint
    #[cfg_attr(
        feature = "config",
        arg(long = "azure-openai-endpoint", env = "AZURE_OPEN_AI_ENDPOINT")
    )]
    pub azure_openai_endpoint: String,

    /// Chat model deployment name
    #[cfg_attr(
        feature = "config",
        arg(
            long = "azure-openai-deployment-model",
            env = "AZURE_OPEN_AI_DEPLOYMENT_MODEL"
        )
    )]
    pub azure_openai_deployment_model: String,

    /// Azure OpenAI API key
    #[cfg_attr(
        feature = "config",
        arg(long = "azure-openai-api-key", env = "AZURE_OPENAI_API_KEY")
    )]
    pub azure_openai_api_key: String,

    /// Azure OpenAI data-plane API version
    #[cfg_attr(
        feature = "config",
        arg(
            long = "azure-openai-api-version",
            env = "AZURE_OPENAI_API_VERSION",
            default_value = DEFAULT_API_VERSION
        )
    )]
    pub azure_openai_api_version: String,

    /// Azure AI Search endpoint
    #[cfg_attr(
        feature = "config",
        arg(long = "azure-ai-search-endpoint", env = "AZURE_AI_SEARCH_ENDPOINT")
    )]
    pub azure_ai_search_endpoint: String,

    /// Azure AI Search API key
    #[cfg_attr(
        feature = "config",
        arg(long = "azure-ai-search-api-key", env = "AZURE_AI_SEARCH_API_KEY")
    )]
    pub azure_ai_search_api_key: String,

    /// Azure AI Search index holding the call transcripts
    #[cfg_attr(
        feature = "config",
        arg(long = "azure-ai-search-index", env = "AZURE_AI_SEARCH_INDEX")
    )]
    pub azure_ai_search_index: String,

    /// Route greeting and SQL completions through the Azure AI project
    #[cfg_attr(
        feature = "config",
        arg(
            long = "use-ai-project-client",
            env = "USE_AI_PROJECT_CLIENT",
            default_value = "false",
            action = clap::ArgAction::Set,
            value_parser = parse_flag
        )
    )]
    pub use_ai_project_client: bool,

    /// Azure AI project connection string (host;subscription;resource group;project)
    #[cfg_attr(
        feature = "config",
        arg(
            long = "azure-ai-project-conn-string",
            env = "AZURE_AI_PROJECT_CONN_STRING"
        )
    )]
    pub azure_ai_project_conn_string: Option<String>,

    /// Model inference endpoint of the project; discovered when unset
    #[cfg_attr(
        feature = "config",
        arg(
            long = "azure-ai-inference-endpoint",
            env = "AZURE_AI_INFERENCE_ENDPOINT"
        )
    )]
    pub azure_ai_inference_endpoint: Option<String>,

    /// Semantic configuration defined on the search index
    #[cfg_attr(
        feature = "config",
        arg(
            long = "semantic-configuration",
            env = "AZURE_AI_SEARCH_SEMANTIC_CONFIGURATION",
            default_value = defaults::SEMANTIC_CONFIGURATION
        )
    )]
    pub semantic_configuration: String,

    /// Embedding deployment used to vectorize search queries
    #[cfg_attr(
        feature = "config",
        arg(
            long = "embedding-deployment",
            env = "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
            default_value = defaults::EMBEDDING_DEPLOYMENT
        )
    )]
    pub embedding_deployment: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "request-timeout-secs",
            env = "KMINE_REQUEST_TIMEOUT_SECS",
            default_value = "30"
        )
    )]
    pub request_timeout_secs: u64,
}

impl ChatWithDataConfig {
    /// Creates a configuration for direct clients with default optional
    /// settings.
    pub fn new(
        azure_openai_endpoint: impl Into<String>,
        azure_openai_deployment_model: impl Into<String>,
        azure_openai_api_key: impl Into<String>,
    ) -> Self {
        Self {
            azure_openai_endpoint: azure_openai_endpoint.into(),
            azure_openai_deployment_model: azure_openai_deployment_model.into(),
            azure_openai_api_key: azure_openai_api_key.into(),
            azure_openai_api_version: DEFAULT_API_VERSION.to_string(),
            azure_ai_search_endpoint: String::new(),
            azure_ai_search_api_key: String::new(),
            azure_ai_search_index: String::new(),
            use_ai_project_client: false,
            azure_ai_project_conn_string: None,
            azure_ai_inference_endpoint: None,
            semantic_configuration: defaults::SEMANTIC_CONFIGURATION.to_string(),
            embedding_deployment: defaults::EMBEDDING_DEPLOYMENT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Sets the search index the transcript tool grounds answers on.
    pub fn with_search(
        mut self,
        endpoint: impl Into<String>,
        index: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.azure_ai_search_endpoint = endpoint.into();
        self.azure_ai_search_index = index.into();
        self.azure_ai_search_api_key = api_key.into();
        self
    }

    /// Routes resolved clients through the given Azure AI project.
    pub fn with_project(mut self, conn_string: impl Into<String>) -> Self {
        self.use_ai_project_client = true;
        self.azure_ai_project_conn_string = Some(conn_string.into());
        self
    }

    /// Sets the project inference endpoint, skipping discovery.
    pub fn with_inference_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.azure_ai_inference_endpoint = Some(endpoint.into());
        self
    }

    /// Returns the chat model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.azure_openai_deployment_model
    }

    /// Returns the request timeout as a Duration.
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Checks that the settings needed by the selected client mode are present.
    pub fn validate(&self) -> Result<()> {
        if self.azure_openai_deployment_model.trim().is_empty() {
            return Err(Error::config("deployment model cannot be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request timeout must be greater than 0"));
        }
        if self.use_ai_project_client {
            self.project_connection()?;
        }
        Ok(())
    }

    /// Builds the configuration of a direct client.
    pub fn direct_client_config(&self) -> Result<DirectClientConfig> {
        let config = DirectClientConfig::builder()
            .with_endpoint(self.azure_openai_endpoint.as_str())
            .with_api_key(self.azure_openai_api_key.as_str())
            .with_api_version(self.azure_openai_api_version.as_str())
            .with_request_timeout(self.request_timeout())
            .build()?;
        Ok(config)
    }

    /// Parses the project connection string.
    pub fn project_connection(&self) -> Result<ProjectConnectionString> {
        let raw = self
            .azure_ai_project_conn_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::config("AZURE_AI_PROJECT_CONN_STRING is required for the project client")
            })?;
        Ok(raw.parse()?)
    }

    /// Builds the configuration of a project client.
    pub fn project_client_config(&self) -> Result<ProjectClientConfig> {
        let builder = ProjectClientConfig::builder()
            .with_connection(self.project_connection()?)
            .with_request_timeout(self.request_timeout());
        let builder = match &self.azure_ai_inference_endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                builder.with_inference_endpoint(endpoint.as_str())
            }
            _ => builder,
        };
        Ok(builder.build()?)
    }

    /// Builds the search data-source parameters for the transcript index.
    pub fn search_parameters(&self) -> AzureSearchParameters {
        AzureSearchParameters::new(
            self.azure_ai_search_endpoint.as_str(),
            self.azure_ai_search_index.as_str(),
            self.azure_ai_search_api_key.as_str(),
        )
        .with_semantic_configuration(self.semantic_configuration.as_str())
        .with_embedding_deployment(self.embedding_deployment.as_str())
    }
}

impl fmt::Debug for ChatWithDataConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatWithDataConfig")
            .field("azure_openai_endpoint", &self.azure_openai_endpoint)
            .field(
                "azure_openai_deployment_model",
                &self.azure_openai_deployment_model,
            )
            .field(
                "azure_openai_api_key",
                &mask_secret(&self.azure_openai_api_key),
            )
            .field("azure_openai_api_version", &self.azure_openai_api_version)
            .field("azure_ai_search_endpoint", &self.azure_ai_search_endpoint)
            .field(
                "azure_ai_search_api_key",
                &mask_secret(&self.azure_ai_search_api_key),
            )
            .field("azure_ai_search_index", &self.azure_ai_search_index)
            .field("use_ai_project_client", &self.use_ai_project_client)
            .field(
                "azure_ai_project_conn_string",
                &self.azure_ai_project_conn_string,
            )
            .field(
                "azure_ai_inference_endpoint",
                &self.azure_ai_inference_endpoint,
            )
            .field("semantic_configuration", &self.semantic_configuration)
            .field("embedding_deployment", &self.embedding_deployment)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChatWithDataConfig {
        ChatWithDataConfig::new("https://res.openai.azure.com", "gpt-4o-mini", "openai-secret")
            .with_search("https://search.windows.net", "call_transcripts", "search-secret")
    }

    #[test]
    fn debug_masks_both_keys() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains("openai-secret"));
        assert!(!debug.contains("search-secret"));
        assert!(debug.contains("open****"));
    }

    #[test]
    fn direct_mode_does_not_need_project() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn project_mode_requires_connection_string() {
        let mut config = config();
        config.use_ai_project_client = true;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = config.with_project("host;sub;rg;proj");
        assert!(config.validate().is_ok());
        assert_eq!(config.project_connection().unwrap().project_name, "proj");
    }

    #[test]
    fn malformed_connection_string_is_rejected() {
        let config = config().with_project("host;sub");
        assert!(config.validate().is_err());
    }

    #[test]
    fn search_parameters_carry_overrides() {
        let mut config = config();
        config.semantic_configuration = "transcripts-semantic".to_string();
        let params = config.search_parameters();
        assert_eq!(params.index_name, "call_transcripts");
        assert_eq!(params.semantic_configuration, "transcripts-semantic");
    }

    #[test]
    fn project_client_config_uses_inference_override() {
        let config = config()
            .with_project("host;sub;rg;proj")
            .with_inference_endpoint("https://ais.services.ai.azure.com/models");
        let project = config.project_client_config().unwrap();
        assert_eq!(
            project.inference_endpoint(),
            Some("https://ais.services.ai.azure.com/models")
        );
    }
}
