//! The chat-with-data tools and their registration table.
//!
//! Each tool answers a free-text question and never fails: collaborator
//! errors are turned into answer text at the tool boundary.

mod greeting;
mod registry;
mod rig_impl;
mod structured;
mod unstructured;

use std::fmt;

pub use greeting::GreetingTool;
use kmine_azure::Choice;
pub use registry::{PARAMETER_DOC, TOOL_SPECS, ToolKind, ToolRegistry, ToolSpec};
pub use rig_impl::QuestionArgs;
use serde::{Deserialize, Serialize};
pub use structured::{MAX_RESULT_CHARS, StructuredDataTool};
pub use unstructured::{
    FALLBACK_ANSWER, MAX_CITATION_CHARS, UnstructuredDataTool, truncate_citations,
};

use crate::Result;

/// Answer produced by a tool.
///
/// Serializes untagged: a JSON string for text answers, the completion
/// choice object (message plus citations) for grounded answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Plain text answer or error text.
    Text(String),
    /// Grounded completion choice.
    Choice(Box<Choice>),
}

impl Answer {
    /// Returns the text if this is a plain text answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Choice(_) => None,
        }
    }

    /// Returns the choice if this is a grounded answer.
    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            Self::Text(_) => None,
            Self::Choice(choice) => Some(choice),
        }
    }

    /// Returns the readable content of the answer.
    pub fn content(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Choice(choice) => choice.message.content.as_deref().unwrap_or_default(),
        }
    }
}

impl From<String> for Answer {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Choice> for Answer {
    fn from(choice: Choice) -> Self {
        Self::Choice(Box::new(choice))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content())
    }
}

/// Keeps at most `max` characters (Unicode scalar values) of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Returns the answer text, or the error's display text on failure.
pub(crate) fn answer_or_error_text(result: Result<String>) -> String {
    result.unwrap_or_else(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use kmine_azure::chat::ResponseMessage;
    use serde_json::json;

    use super::*;
    use crate::Error;

    #[test]
    fn truncate_chars_counts_scalars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn error_text_is_display_string() {
        let text = answer_or_error_text(Err(Error::executor("deadlock")));
        assert_eq!(text, "executor error: deadlock");
        assert_eq!(answer_or_error_text(Ok("ok".into())), "ok");
    }

    #[test]
    fn answer_serializes_untagged() {
        let text = Answer::from("hi".to_string());
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("hi"));

        let choice = Choice {
            message: ResponseMessage {
                content: Some("grounded".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let answer = Answer::from(choice);
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["message"]["content"], "grounded");
        assert_eq!(answer.to_string(), "grounded");
        assert!(answer.as_text().is_none());
    }
}
