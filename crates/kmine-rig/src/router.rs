//! Function-calling router that lets the model pick a tool.

use std::sync::Arc;

use kmine_azure::chat::{ToolCall, ToolChoice};
use kmine_azure::{ChatCompletionRequest, ChatMessage};
use serde::Serialize;

use crate::resolver::ClientResolver;
use crate::tool::{Answer, QuestionArgs, ToolKind, ToolRegistry};
use crate::{ChatWithDataConfig, Error, Result, TRACING_TARGET_ROUTER};

const INSTRUCTIONS: &str = "You are a helpful assistant for analysts of call center data. \
Call exactly one of the provided functions to answer the user's question. \
Use ChatWithSQLDatabase for counts, trends and other quantified results, \
ChatWithCallTranscripts for summaries and explanations of what was said in calls, \
and Greeting for greetings and anything else.";

/// A routed answer together with the tool that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedAnswer {
    /// Tool that answered.
    pub tool: ToolKind,
    /// Its answer.
    pub answer: Answer,
}

/// Asks the completion provider which tool fits a question, then runs it.
///
/// A router failure or an unknown function name falls back to the greeting
/// tool with the original question.
#[derive(Clone)]
pub struct FunctionRouter {
    config: Arc<ChatWithDataConfig>,
    resolver: Arc<dyn ClientResolver>,
    registry: ToolRegistry,
}

impl FunctionRouter {
    /// Creates a router over the registered tools.
    pub fn new(
        config: Arc<ChatWithDataConfig>,
        resolver: Arc<dyn ClientResolver>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            config,
            resolver,
            registry,
        }
    }

    /// Returns the registry the router dispatches to.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Routes the question and returns the chosen tool's answer.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_ROUTER, fields(question_len = question.len()))]
    pub async fn route(&self, question: &str) -> RoutedAnswer {
        let (tool, input) = match self.select(question).await {
            Ok(selection) => selection,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_ROUTER,
                    error = %err,
                    "Tool selection failed, falling back to greeting"
                );
                (ToolKind::Greeting, question.to_string())
            }
        };

        tracing::info!(target: TRACING_TARGET_ROUTER, tool = %tool, "Routing question");
        let answer = self.registry.dispatch(tool, &input).await;
        RoutedAnswer { tool, answer }
    }

    /// Asks the model for a function call and returns the tool and question.
    async fn select(&self, question: &str) -> Result<(ToolKind, String)> {
        let client = self.resolver.resolve().await?;

        let request = ChatCompletionRequest::builder()
            .with_model(self.config.model())
            .with_messages(vec![
                ChatMessage::system(INSTRUCTIONS),
                ChatMessage::user(question),
            ])
            .with_temperature(0.0_f32)
            .with_tools(self.registry.function_tools())
            .with_tool_choice(ToolChoice::Required)
            .build()?;

        let completion = client.complete(&request).await?;
        let choice = completion
            .into_first_choice()
            .ok_or_else(|| Error::empty_response(client.provider_name()))?;

        let call = choice
            .message
            .tool_calls
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(client.provider_name(), "no function was called"))?;

        selection_from(call, question)
    }
}

/// Maps a function call to a tool and its question.
///
/// Arguments that cannot be read fall back to the original question.
fn selection_from(call: ToolCall, question: &str) -> Result<(ToolKind, String)> {
    let kind = ToolKind::from_name(&call.function.name).ok_or_else(|| {
        Error::provider("router", format!("unknown function '{}'", call.function.name))
    })?;

    let input = call
        .function
        .parse_arguments()
        .ok()
        .and_then(|value| serde_json::from_value::<QuestionArgs>(value).ok())
        .map(|args| args.input)
        .filter(|input| !input.trim().is_empty())
        .unwrap_or_else(|| question.to_string());

    Ok((kind, input))
}

impl std::fmt::Debug for FunctionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRouter")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
