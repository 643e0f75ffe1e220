//! Completion clients.
//!
//! Both variants accept the same [`ChatCompletionRequest`] and return the same
//! [`ChatCompletion`], so callers pick one at construction time and never
//! branch on it afterwards.

mod direct;
mod http;
mod project;

use std::sync::Arc;

use async_trait::async_trait;
pub use direct::DirectClient;
pub use project::ProjectClient;

use crate::chat::{ChatCompletion, ChatCompletionRequest};

/// A chat completion endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Short provider name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Sends one chat completion request.
    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion>;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Box<T> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> kmine_core::Result<ChatCompletion> {
        (**self).complete(request).await
    }
}
