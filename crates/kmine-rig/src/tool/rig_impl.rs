//! rig-core [`Tool`] implementations so any rig agent can mount the tools.

use std::convert::Infallible;

use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::Deserialize;

use super::registry::ToolKind;
use super::{Answer, GreetingTool, StructuredDataTool, UnstructuredDataTool};

/// Arguments shared by all three tools.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionArgs {
    /// The question.
    #[serde(alias = "question")]
    pub input: String,
}

fn definition_of(kind: ToolKind) -> ToolDefinition {
    let spec = kind.spec();
    ToolDefinition {
        name: spec.name.to_string(),
        description: spec.description.to_string(),
        parameters: spec.parameters_schema(),
    }
}

impl Tool for GreetingTool {
    type Args = QuestionArgs;
    type Error = Infallible;
    type Output = String;

    const NAME: &'static str = GreetingTool::NAME;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of(ToolKind::Greeting)
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(self.answer(&args.input).await)
    }
}

impl Tool for StructuredDataTool {
    type Args = QuestionArgs;
    type Error = Infallible;
    type Output = String;

    const NAME: &'static str = StructuredDataTool::NAME;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of(ToolKind::ChatWithSqlDatabase)
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(self.answer(&args.input).await)
    }
}

impl Tool for UnstructuredDataTool {
    type Args = QuestionArgs;
    type Error = Infallible;
    type Output = Answer;

    const NAME: &'static str = UnstructuredDataTool::NAME;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        definition_of(ToolKind::ChatWithCallTranscripts)
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        Ok(self.answer(&args.input).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::{StubClient, StubResolver, test_config};
    use crate::tool::FALLBACK_ANSWER;

    #[test]
    fn args_accept_input_or_question() {
        let args: QuestionArgs = serde_json::from_str(r#"{"input":"hi"}"#).unwrap();
        assert_eq!(args.input, "hi");
        let args: QuestionArgs = serde_json::from_str(r#"{"question":"hello"}"#).unwrap();
        assert_eq!(args.input, "hello");
    }

    #[tokio::test]
    async fn greeting_definition_and_call() {
        let tool = GreetingTool::new(
            Arc::new(test_config()),
            Arc::new(StubResolver::new(StubClient::text("Hi there!"))),
        );

        let definition = tool.definition(String::new()).await;
        assert_eq!(definition.name, "Greeting");
        assert_eq!(
            definition.description,
            "Respond to any greeting or general questions"
        );
        assert_eq!(
            definition.parameters["properties"]["input"]["description"],
            "the question"
        );

        let output = Tool::call(&tool, QuestionArgs { input: "Hello".into() }).await;
        assert_eq!(output.unwrap(), "Hi there!");
    }

    #[tokio::test]
    async fn transcript_call_never_errors() {
        let tool = UnstructuredDataTool::new(
            Arc::new(test_config()),
            Arc::new(StubResolver::new(StubClient::connection_refused())),
        );
        let output = Tool::call(&tool, QuestionArgs { input: "q".into() }).await;
        assert_eq!(output.unwrap(), Answer::Text(FALLBACK_ANSWER.to_string()));
    }
}
