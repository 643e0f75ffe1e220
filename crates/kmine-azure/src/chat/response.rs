//! Chat completion response body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::message::Role;
use super::tools::ToolCall;

/// Response of a `chat/completions` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Completion identifier.
    #[serde(default)]
    pub id: String,
    /// Model that produced the completion.
    #[serde(default)]
    pub model: String,
    /// Generated alternatives.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token accounting, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Returns the first choice, if any.
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Returns the text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.first_choice()
            .and_then(|choice| choice.message.content.as_deref())
    }

    /// Consumes the completion and returns its first choice.
    pub fn into_first_choice(self) -> Option<Choice> {
        self.choices.into_iter().next()
    }
}

/// One generated alternative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Position in the `choices` array.
    #[serde(default)]
    pub index: u32,
    /// Generated message.
    #[serde(default)]
    pub message: ResponseMessage,
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Message generated by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Author role, normally [`Role::Assistant`].
    #[serde(default)]
    pub role: Role,
    /// Generated text; absent when the model only called functions.
    #[serde(default)]
    pub content: Option<String>,
    /// Retrieval context attached by data sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<MessageContext>,
    /// Function calls requested by the model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

/// Retrieval context of a grounded answer.
///
/// Citations are kept as raw JSON objects; their shape belongs to the
/// search index and only the `content` field is interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Documents the answer is grounded on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Value>>,
    /// Search intent derived from the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Any other context fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token usage of a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Generated tokens.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Sum of both.
    #[serde(default)]
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_grounded_completion() {
        let body = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": {
                    "role": "assistant",
                    "content": "Customers mostly asked about billing.",
                    "context": {
                        "intent": "[\"billing\"]",
                        "citations": [{"content": "call 1", "url": "https://x", "chunk_id": "0"}],
                        "all_retrieved_documents": []
                    }
                }
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });

        let completion: ChatCompletion = serde_json::from_value(body).unwrap();
        assert_eq!(completion.text(), Some("Customers mostly asked about billing."));

        let context = completion.choices[0].message.context.as_ref().unwrap();
        assert_eq!(context.citations.as_ref().unwrap().len(), 1);
        assert!(context.extra.contains_key("all_retrieved_documents"));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn parses_tool_call_without_content() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "Greeting", "arguments": "{\"input\":\"hi\"}"}
                    }]
                }
            }]
        });

        let completion: ChatCompletion = serde_json::from_value(body).unwrap();
        assert_eq!(completion.text(), None);
        let call = &completion.choices[0].message.tool_calls[0];
        assert_eq!(call.function.name, "Greeting");
    }

    #[test]
    fn empty_choices_have_no_text() {
        let completion: ChatCompletion = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(completion.first_choice().is_none());
        assert!(completion.into_first_choice().is_none());
    }
}
