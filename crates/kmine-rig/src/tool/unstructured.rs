//! Explanatory questions answered from the call transcript index.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use kmine_azure::{ChatCompletionRequest, ChatMessage, Choice};
use serde_json::Value;

use super::{Answer, truncate_chars};
use crate::resolver::ClientResolver;
use crate::{ChatWithDataConfig, Error, Result, TRACING_TARGET_TOOL};

/// Answer returned whenever the grounded completion fails.
pub const FALLBACK_ANSWER: &str = "Details could not be retrieved. Please try again later.";

/// Longest citation content kept, in characters, before the ellipsis.
pub const MAX_CITATION_CHARS: usize = 300;

const SEED: i64 = 42;
const MAX_TOKENS: u32 = 800;

const PERSONA: &str = "You are an assistant who provides an analyst with helpful information about data.\n        \
You have access to the call transcripts, call data, topics, sentiments, and key phrases.\n        \
You can use this information to answer questions.\n        \
If you cannot answer the question, always return - I cannot answer this question from the data available. Please rephrase or add more details.";

/// Shortens every citation whose `content` is a string longer than
/// [`MAX_CITATION_CHARS`] to that many characters plus `"..."`.
///
/// Citations that are not objects, or have no string `content`, are left
/// untouched.
pub fn truncate_citations(choice: &mut Choice) {
    let Some(citations) = choice
        .message
        .context
        .as_mut()
        .and_then(|context| context.citations.as_mut())
    else {
        return;
    };

    for citation in citations.iter_mut() {
        if let Some(Value::String(content)) = citation
            .as_object_mut()
            .and_then(|fields| fields.get_mut("content"))
        {
            if content.chars().count() > MAX_CITATION_CHARS {
                *content = format!("{}...", truncate_chars(content, MAX_CITATION_CHARS));
            }
        }
    }
}

/// Answers from the transcript search index through a grounded completion.
///
/// Always uses the API-key client: retrieval augmentation is only available
/// on the Azure OpenAI resource.
#[derive(Clone)]
pub struct UnstructuredDataTool {
    config: Arc<ChatWithDataConfig>,
    resolver: Arc<dyn ClientResolver>,
}

impl UnstructuredDataTool {
    /// Tool name.
    pub const NAME: &'static str = "ChatWithCallTranscripts";

    /// Creates the tool.
    pub fn new(config: Arc<ChatWithDataConfig>, resolver: Arc<dyn ClientResolver>) -> Self {
        Self { config, resolver }
    }

    /// Answers with the first completion choice, citations shortened, or
    /// with [`FALLBACK_ANSWER`] on any failure, including a panic.
    #[tracing::instrument(skip_all, fields(tool = Self::NAME, question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> Answer {
        match AssertUnwindSafe(self.try_answer(question))
            .catch_unwind()
            .await
        {
            Ok(Ok(choice)) => Answer::from(choice),
            Ok(Err(err)) => {
                tracing::warn!(target: TRACING_TARGET_TOOL, error = %err, "Transcript answer failed");
                Answer::Text(FALLBACK_ANSWER.to_string())
            }
            Err(_) => {
                tracing::error!(target: TRACING_TARGET_TOOL, "Transcript answer panicked");
                Answer::Text(FALLBACK_ANSWER.to_string())
            }
        }
    }

    fn request(&self, question: &str) -> Result<ChatCompletionRequest> {
        let source = self
            .config
            .search_parameters()
            .with_role_information(PERSONA)
            .into_data_source();

        let request = ChatCompletionRequest::builder()
            .with_model(self.config.model())
            .with_messages(vec![ChatMessage::system(PERSONA), ChatMessage::user(question)])
            .with_seed(SEED)
            .with_temperature(0.0_f32)
            .with_max_tokens(MAX_TOKENS)
            .with_data_sources(vec![source])
            .build()?;
        Ok(request)
    }

    async fn try_answer(&self, question: &str) -> Result<Choice> {
        let client = self.resolver.resolve_direct().await?;
        let request = self.request(question)?;

        let completion = client.complete(&request).await?;
        let mut choice = completion
            .into_first_choice()
            .ok_or_else(|| Error::empty_response(client.provider_name()))?;

        truncate_citations(&mut choice);
        tracing::debug!(
            target: TRACING_TARGET_TOOL,
            citations = choice
                .message
                .context
                .as_ref()
                .and_then(|c| c.citations.as_ref())
                .map_or(0, Vec::len),
            "Transcript answer grounded"
        );
        Ok(choice)
    }
}

impl std::fmt::Debug for UnstructuredDataTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnstructuredDataTool")
            .field("model", &self.config.model())
            .field("index", &self.config.azure_ai_search_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use kmine_azure::chat::{MessageContext, ResponseMessage};
    use serde_json::json;

    use super::*;
    use crate::mock::{StubClient, StubResolver, test_config};

    fn tool(resolver: StubResolver) -> UnstructuredDataTool {
        UnstructuredDataTool::new(Arc::new(test_config()), Arc::new(resolver))
    }

    fn choice_with(citations: Vec<Value>) -> Choice {
        Choice {
            message: ResponseMessage {
                content: Some("Billing disputes dominate.".into()),
                context: Some(MessageContext {
                    citations: Some(citations),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn citations(choice: &Choice) -> &Vec<Value> {
        choice
            .message
            .context
            .as_ref()
            .and_then(|c| c.citations.as_ref())
            .unwrap()
    }

    #[test]
    fn long_citation_content_is_cut() {
        let mut choice = choice_with(vec![json!({"content": "a".repeat(400), "url": "u"})]);
        truncate_citations(&mut choice);

        let citation = &citations(&choice)[0];
        assert_eq!(citation["content"], format!("{}...", "a".repeat(300)));
        assert_eq!(citation["url"], "u");
    }

    #[test]
    fn short_and_unusual_citations_are_untouched() {
        let original = vec![
            json!({"content": "b".repeat(300)}),
            json!({"content": "short"}),
            json!({"title": "no content"}),
            json!({"content": 12345}),
            json!("a bare string citation"),
            json!(null),
        ];
        let mut choice = choice_with(original.clone());
        truncate_citations(&mut choice);
        assert_eq!(citations(&choice), &original);
    }

    #[test]
    fn missing_context_is_fine() {
        let mut choice = Choice::default();
        truncate_citations(&mut choice);
        assert!(choice.message.context.is_none());
    }

    #[test]
    fn persona_sentences_are_on_separate_lines() {
        let lines: Vec<_> = PERSONA.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("helpful information about data."));
        assert_eq!(
            lines[1],
            "        You have access to the call transcripts, call data, topics, sentiments, and key phrases."
        );
        assert_eq!(lines[2], "        You can use this information to answer questions.");
        assert!(lines[3].starts_with("        If you cannot answer the question"));
    }

    #[test]
    fn request_carries_grounding_parameters() {
        let request = tool(StubResolver::new(StubClient::text("x")))
            .request("What do customers complain about?")
            .unwrap();
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["seed"], 42);
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["messages"][0]["content"], PERSONA);

        let params = &value["data_sources"][0]["parameters"];
        assert_eq!(value["data_sources"][0]["type"], "azure_search");
        assert_eq!(params["index_name"], "call_transcripts");
        assert_eq!(params["role_information"], PERSONA);
        assert_eq!(params["query_type"], "vector_simple_hybrid");
        assert_eq!(params["fields_mapping"]["filepath_field"], "chunk_id");
        assert_eq!(params["fields_mapping"]["title_field"], "sourceurl");
    }

    #[tokio::test]
    async fn returns_first_choice_with_truncated_citations() {
        let client = StubClient::choice(choice_with(vec![json!({"content": "c".repeat(1000)})]));
        let resolver = StubResolver::new(client);
        let answer = tool(resolver.clone()).answer("Why do customers call?").await;

        let choice = answer.as_choice().unwrap();
        assert_eq!(answer.content(), "Billing disputes dominate.");
        assert_eq!(
            citations(choice)[0]["content"].as_str().unwrap().chars().count(),
            303
        );
        assert_eq!(resolver.resolve_direct_calls(), 1);
        assert_eq!(resolver.resolve_calls(), 0);
    }

    #[tokio::test]
    async fn connection_error_yields_fallback() {
        let answer = tool(StubResolver::new(StubClient::connection_refused()))
            .answer("q")
            .await;
        assert_eq!(answer, Answer::Text(FALLBACK_ANSWER.to_string()));
    }

    #[tokio::test]
    async fn empty_choices_yield_fallback() {
        let answer = tool(StubResolver::new(StubClient::empty())).answer("q").await;
        assert_eq!(answer.as_text(), Some(FALLBACK_ANSWER));
    }

    #[tokio::test]
    async fn panic_yields_fallback() {
        let answer = tool(StubResolver::new(StubClient::panicking())).answer("q").await;
        assert_eq!(answer.as_text(), Some(FALLBACK_ANSWER));
    }
}
