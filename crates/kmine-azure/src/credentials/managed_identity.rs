//! Managed identity of the hosting compute.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{AccessToken, CredentialProvider, TRACING_TARGET, scope_to_resource};
use crate::error::{Error, Result};

/// Instance metadata service token endpoint (VMs, AKS, Container Apps without
/// the identity sidecar).
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

/// IMDS does not answer at all outside Azure; fail fast there.
const IMDS_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the managed identity token is requested from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// App Service / Functions identity endpoint with its secret header.
    AppService { endpoint: String, header: String },
    /// Instance metadata service.
    Imds,
}

/// Token response of both identity endpoints. `expires_on` is a string
/// on some hosts and a number on others.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<ExpiresOn>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresOn {
    Number(u64),
    Text(String),
}

impl ExpiresOn {
    fn as_secs(&self) -> Option<u64> {
        match self {
            Self::Number(secs) => Some(*secs),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Acquires tokens from the managed identity endpoint of the host.
#[derive(Clone)]
pub struct ManagedIdentityCredential {
    http: Client,
    source: Source,
    client_id: Option<String>,
}

impl ManagedIdentityCredential {
    /// Detects the identity endpoint from `IDENTITY_ENDPOINT` and
    /// `IDENTITY_HEADER`, falling back to IMDS. `AZURE_CLIENT_ID` selects a
    /// user-assigned identity.
    pub fn from_env() -> Self {
        Self::from_env_with_client(Client::new())
    }

    /// Same as [`Self::from_env`] with a caller-provided HTTP client.
    pub fn from_env_with_client(http: Client) -> Self {
        let source = match (
            std::env::var("IDENTITY_ENDPOINT").ok(),
            std::env::var("IDENTITY_HEADER").ok(),
        ) {
            (Some(endpoint), Some(header)) => Source::AppService { endpoint, header },
            _ => Source::Imds,
        };

        Self {
            http,
            source,
            client_id: std::env::var("AZURE_CLIENT_ID").ok(),
        }
    }

    /// Uses the instance metadata service, optionally for a user-assigned
    /// identity.
    pub fn imds(http: Client, client_id: Option<String>) -> Self {
        Self {
            http,
            source: Source::Imds,
            client_id,
        }
    }

    fn token_url(&self, scope: &str) -> Result<Url> {
        let resource = scope_to_resource(scope);
        let (base, api_version) = match &self.source {
            Source::AppService { endpoint, .. } => (endpoint.as_str(), APP_SERVICE_API_VERSION),
            Source::Imds => (IMDS_ENDPOINT, IMDS_API_VERSION),
        };

        let mut url = Url::parse(base)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-version", api_version);
            query.append_pair("resource", resource);
            if let Some(client_id) = &self.client_id {
                query.append_pair("client_id", client_id);
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ManagedIdentityCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::AppService { endpoint, .. } => endpoint.as_str(),
            Source::Imds => IMDS_ENDPOINT,
        };
        f.debug_struct("ManagedIdentityCredential")
            .field("source", &source)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    fn name(&self) -> &'static str {
        "managed_identity"
    }

    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let url = self.token_url(scope)?;
        tracing::debug!(
            target: TRACING_TARGET,
            host = url.host_str().unwrap_or_default(),
            scope,
            "Requesting managed identity token"
        );

        let request = match &self.source {
            Source::AppService { header, .. } => {
                self.http.get(url).header("X-IDENTITY-HEADER", header)
            }
            Source::Imds => self
                .http
                .get(url)
                .header("Metadata", "true")
                .timeout(IMDS_TIMEOUT),
        };

        let response = request.send().await.map_err(|e| {
            Error::credential(format!("managed identity endpoint unreachable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::credential(format!(
                "managed identity endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await?;
        let expires_on = token.expires_on.as_ref().and_then(ExpiresOn::as_secs);
        Ok(AccessToken::new(token.access_token, expires_on))
    }
}
