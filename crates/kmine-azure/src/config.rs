//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use url::Url;

use crate::error::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Default Azure OpenAI data-plane API version.
    pub const API_VERSION: &str = "2024-05-01-preview";

    /// Default request timeout in seconds.
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
}

/// Default Azure OpenAI data-plane API version.
pub const DEFAULT_API_VERSION: &str = defaults::API_VERSION;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = defaults::REQUEST_TIMEOUT_SECS;

/// Masks a secret for logging: the first four characters followed by
/// `****`, or just `****` for short values.
pub fn mask_secret(secret: &str) -> String {
    match secret.char_indices().nth(4) {
        Some((idx, _)) if secret.chars().count() > 8 => format!("{}****", &secret[..idx]),
        _ => "****".to_string(),
    }
}

fn validate_endpoint(endpoint: &str) -> std::result::Result<(), String> {
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(format!(
            "Endpoint must start with http:// or https://, got {}",
            endpoint
        ));
    }
    Ok(())
}

/// Validates the DirectClientConfig before building.
fn validate_direct_config(builder: &DirectClientConfigBuilder) -> std::result::Result<(), String> {
    if let Some(endpoint) = &builder.endpoint {
        validate_endpoint(endpoint)?;
    }

    if let Some(api_key) = &builder.api_key {
        if api_key.trim().is_empty() {
            return Err("API key cannot be empty".to_string());
        }
    }

    if let Some(Some(timeout)) = builder.request_timeout {
        if timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }
    }

    Ok(())
}

/// Configuration of a client that talks to an Azure OpenAI resource with an
/// API key.
///
/// # Examples
///
/// ```rust
/// use kmine_azure::DirectClientConfig;
///
/// let config = DirectClientConfig::builder()
///     .with_endpoint("https://my-resource.openai.azure.com")
///     .with_api_key("secret-key")
///     .build()
///     .unwrap();
/// assert_eq!(config.api_version(), "2024-05-01-preview");
/// ```
#[derive(Clone, Builder)]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_direct_config", error = "Error")
)]
pub struct DirectClientConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    endpoint: String,

    /// Resource API key, sent as the `api-key` header.
    api_key: String,

    /// Data-plane API version (default: 2024-05-01-preview).
    #[builder(default)]
    api_version: Option<String>,

    /// Timeout for API requests (default: 30s).
    #[builder(default)]
    request_timeout: Option<Duration>,
}

impl DirectClientConfig {
    /// Returns a builder for the configuration.
    pub fn builder() -> DirectClientConfigBuilder {
        DirectClientConfigBuilder::default()
    }

    /// Returns the resource endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the API key masked for logging.
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }

    /// Returns the API version.
    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(defaults::API_VERSION)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
    }

    /// Builds the completion URL of a deployment:
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`.
    pub fn chat_completions_url(&self, deployment: &str) -> Result<Url> {
        if deployment.trim().is_empty() {
            return Err(Error::config("deployment name cannot be empty"));
        }

        let mut url = Url::parse(&self.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("endpoint cannot be a base: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["openai", "deployments", deployment, "chat", "completions"]);
        url.query_pairs_mut()
            .append_pair("api-version", self.api_version());
        Ok(url)
    }
}

impl fmt::Debug for DirectClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.masked_api_key())
            .field("api_version", &self.api_version())
            .field("request_timeout", &self.request_timeout())
            .finish()
    }
}

/// Coordinates of an Azure AI project, parsed from
/// `<host>;<subscription_id>;<resource_group>;<project_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConnectionString {
    /// Regional project host, e.g. `eastus.api.azureml.ms`.
    pub host: String,
    /// Azure subscription id.
    pub subscription_id: String,
    /// Resource group name.
    pub resource_group: String,
    /// Project (workspace) name.
    pub project_name: String,
}

impl ProjectConnectionString {
    /// Returns the Resource Manager path of the project workspace.
    pub fn workspace_path(&self) -> String {
        format!(
            "subscriptions/{}/resourceGroups/{}/providers/Microsoft.MachineLearningServices/workspaces/{}",
            self.subscription_id, self.resource_group, self.project_name
        )
    }
}

impl FromStr for ProjectConnectionString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(';').map(str::trim).collect();
        match parts.as_slice() {
            [host, subscription_id, resource_group, project_name]
                if parts.iter().all(|part| !part.is_empty()) =>
            {
                Ok(Self {
                    host: host.to_string(),
                    subscription_id: subscription_id.to_string(),
                    resource_group: resource_group.to_string(),
                    project_name: project_name.to_string(),
                })
            }
            _ => Err(Error::config(
                "project connection string must be \
                 <host>;<subscription_id>;<resource_group>;<project_name>",
            )),
        }
    }
}

impl fmt::Display for ProjectConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{}",
            self.host, self.subscription_id, self.resource_group, self.project_name
        )
    }
}

/// Validates the ProjectClientConfig before building.
fn validate_project_config(
    builder: &ProjectClientConfigBuilder,
) -> std::result::Result<(), String> {
    if let Some(Some(endpoint)) = &builder.inference_endpoint {
        validate_endpoint(endpoint)?;
    }

    if let Some(Some(timeout)) = builder.request_timeout {
        if timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }
    }

    Ok(())
}

/// Configuration of a client scoped to an Azure AI project.
#[derive(Debug, Clone, Builder)]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_project_config", error = "Error")
)]
pub struct ProjectClientConfig {
    /// Project coordinates.
    connection: ProjectConnectionString,

    /// Inference endpoint; discovered from the project when unset.
    #[builder(default)]
    inference_endpoint: Option<String>,

    /// Timeout for API requests (default: 30s).
    #[builder(default)]
    request_timeout: Option<Duration>,
}

impl ProjectClientConfig {
    /// Returns a builder for the configuration.
    pub fn builder() -> ProjectClientConfigBuilder {
        ProjectClientConfigBuilder::default()
    }

    /// Returns the project coordinates.
    pub fn connection(&self) -> &ProjectConnectionString {
        &self.connection
    }

    /// Returns the inference endpoint override.
    pub fn inference_endpoint(&self) -> Option<&str> {
        self.inference_endpoint.as_deref()
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .unwrap_or(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
    }
}
