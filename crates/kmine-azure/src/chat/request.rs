//! Chat completion request body.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::tools::{FunctionTool, ToolChoice};
use crate::data_source::DataSource;
use crate::error::Error;

/// Validates the request before building.
fn validate_request(builder: &ChatCompletionRequestBuilder) -> std::result::Result<(), String> {
    match &builder.messages {
        Some(messages) if !messages.is_empty() => {}
        _ => return Err("At least one message is required".to_string()),
    }

    if let Some(Some(temp)) = builder.temperature {
        if !(0.0..=2.0).contains(&temp) {
            return Err(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                temp
            ));
        }
    }

    if let Some(Some(max_tokens)) = builder.max_tokens {
        if max_tokens == 0 {
            return Err("Max tokens must be greater than 0".to_string());
        }
    }

    Ok(())
}

/// Body of a `chat/completions` call.
///
/// The model name is sent in the body for project endpoints; direct
/// deployments ignore it because the deployment is part of the URL.
///
/// # Examples
///
/// ```rust
/// use kmine_azure::{ChatCompletionRequest, ChatMessage};
///
/// let request = ChatCompletionRequest::builder()
///     .with_model("gpt-4o-mini")
///     .with_messages(vec![ChatMessage::user("hello")])
///     .with_temperature(0.0_f32)
///     .build()
///     .unwrap();
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "validate_request", error = "Error")
)]
pub struct ChatCompletionRequest {
    /// Model or deployment name.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature (0.0-2.0).
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Seed for best-effort deterministic sampling.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// Upper bound on generated tokens.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Retrieval data sources.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<DataSource>,

    /// Functions the model may call.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<FunctionTool>,

    /// Function calling mode.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

impl ChatCompletionRequest {
    /// Returns a builder for the request.
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::default()
    }

    /// Returns true if any retrieval data source is attached.
    pub fn has_data_sources(&self) -> bool {
        !self.data_sources.is_empty()
    }
}
