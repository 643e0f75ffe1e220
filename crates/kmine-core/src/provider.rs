//! Provider creation trait.

use crate::Result;

/// Trait for creating a provider from parameters and credentials.
///
/// This trait bridges non-sensitive parameters (endpoint, deployment, API
/// version) with sensitive credentials (API keys, token sources) to construct
/// a fully configured provider instance.
///
/// # Type Parameters
///
/// - `Params`: Non-sensitive configuration (e.g., endpoint, api version)
/// - `Credentials`: Sensitive authentication data (e.g., API keys, token providers)
///
/// # Example
///
/// ```ignore
/// #[async_trait::async_trait]
/// impl IntoProvider for DirectClient {
///     type Params = DirectClientConfig;
///     type Credentials = ApiKeyCredentials;
///
///     async fn create(params: Self::Params, credentials: Self::Credentials) -> Result<Self> {
///         // Build the client from params and credentials
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait IntoProvider: Send {
    /// Non-sensitive parameters (endpoint, deployment, api version, etc.).
    type Params: Send;
    /// Sensitive credentials (API keys, token providers, etc.).
    type Credentials: Send;

    /// Creates a new provider from parameters and credentials.
    async fn create(params: Self::Params, credentials: Self::Credentials) -> Result<Self>
    where
        Self: Sized;
}
