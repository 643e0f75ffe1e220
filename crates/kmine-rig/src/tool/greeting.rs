//! Greeting and general-question tool.

use std::sync::Arc;

use kmine_azure::{ChatCompletionRequest, ChatMessage};

use super::answer_or_error_text;
use crate::resolver::ClientResolver;
use crate::{ChatWithDataConfig, Error, Result, TRACING_TARGET_TOOL};

const PERSONA: &str = "You are a helpful assistant to respond to any greeting or general questions.";

/// Answers greetings and general questions with a plain completion.
#[derive(Clone)]
pub struct GreetingTool {
    config: Arc<ChatWithDataConfig>,
    resolver: Arc<dyn ClientResolver>,
}

impl GreetingTool {
    /// Tool name.
    pub const NAME: &'static str = "Greeting";

    /// Creates the tool.
    pub fn new(config: Arc<ChatWithDataConfig>, resolver: Arc<dyn ClientResolver>) -> Self {
        Self { config, resolver }
    }

    /// Answers the question; on failure the error text is the answer.
    #[tracing::instrument(skip_all, fields(tool = Self::NAME, question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> String {
        let answer = self.try_answer(question).await.inspect_err(|err| {
            tracing::warn!(target: TRACING_TARGET_TOOL, error = %err, "Greeting failed");
        });
        answer_or_error_text(answer)
    }

    async fn try_answer(&self, question: &str) -> Result<String> {
        let client = self.resolver.resolve().await?;

        let request = ChatCompletionRequest::builder()
            .with_model(self.config.model())
            .with_messages(vec![ChatMessage::system(PERSONA), ChatMessage::user(question)])
            .with_temperature(0.0_f32)
            .build()?;

        let completion = client.complete(&request).await?;
        let choice = completion
            .into_first_choice()
            .ok_or_else(|| Error::empty_response(client.provider_name()))?;

        tracing::debug!(target: TRACING_TARGET_TOOL, provider = client.provider_name(), "Greeting answered");
        Ok(choice.message.content.unwrap_or_default())
    }
}

impl std::fmt::Debug for GreetingTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreetingTool")
            .field("model", &self.config.model())
            .finish_non_exhaustive()
    }
}
